//! Human-like pacing between automated actions.

use crate::config::Config;
use rand::RngExt;
use std::time::Duration;
use tracing::{debug, trace};

/// Delay policy applied after every navigation and every typed character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Fixed part of the post-navigation delay
    pub base_ms: u64,
    /// Random extra (0 to this value) added to the post-navigation delay
    pub jitter_ms: u64,
    /// Lower bound of the per-keystroke delay
    pub keystroke_min_ms: u64,
    /// Upper bound of the per-keystroke delay
    pub keystroke_max_ms: u64,
}

impl Pacing {
    /// Builds the policy from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_ms: config.delay_ms,
            jitter_ms: config.delay_jitter_ms,
            keystroke_min_ms: config.keystroke_min_ms,
            keystroke_max_ms: config.keystroke_max_ms.max(config.keystroke_min_ms),
        }
    }

    /// No delays at all (tests, replaying saved pages).
    pub fn disabled() -> Self {
        Self { base_ms: 0, jitter_ms: 0, keystroke_min_ms: 0, keystroke_max_ms: 0 }
    }

    pub fn is_disabled(&self) -> bool {
        self.base_ms == 0 && self.jitter_ms == 0 && self.keystroke_max_ms == 0
    }

    /// Draws a post-navigation delay.
    pub fn navigation_delay(&self) -> Duration {
        let jitter = if self.jitter_ms > 0 { rand::rng().random_range(0..=self.jitter_ms) } else { 0 };
        Duration::from_millis(self.base_ms + jitter)
    }

    /// Draws a per-keystroke delay.
    pub fn keystroke_delay(&self) -> Duration {
        if self.keystroke_max_ms == 0 {
            return Duration::ZERO;
        }
        let ms = rand::rng().random_range(self.keystroke_min_ms..=self.keystroke_max_ms);
        Duration::from_millis(ms)
    }

    /// Waits after a navigation so the new page can settle.
    pub async fn after_navigation(&self) {
        let delay = self.navigation_delay();
        if delay.is_zero() {
            return;
        }
        debug!("Delaying {}ms", delay.as_millis());
        tokio::time::sleep(delay).await;
    }

    /// Waits after a typed character.
    pub async fn after_keystroke(&self) {
        let delay = self.keystroke_delay();
        if delay.is_zero() {
            return;
        }
        trace!("Keystroke delay {}ms", delay.as_millis());
        tokio::time::sleep(delay).await;
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
