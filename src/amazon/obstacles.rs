//! Dismissal of consent and preference prompts.

use crate::amazon::pacing::Pacing;
use crate::amazon::selectors::obstacles;
use crate::amazon::session::Session;
use crate::error::ScrapeError;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Controls clicked, in order, after every fresh navigation.
static CONTROLS: [(&str, &LazyLock<Selector>); 2] = [
    ("dismiss", &obstacles::DISMISS),
    ("keep preference", &obstacles::KEEP_PREFERENCE),
];

/// What happened while clearing prompts on one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleReport {
    /// Controls that were found and clicked
    pub cleared: Vec<String>,
    /// Controls that were found but could not be clicked
    pub unresolved: Vec<String>,
}

impl ObstacleReport {
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// Folds another page's report into this one.
    pub fn merge(&mut self, other: ObstacleReport) {
        self.cleared.extend(other.cleared);
        self.unresolved.extend(other.unresolved);
    }
}

/// Clicks any visible dismiss / keep-preference controls on the current page.
///
/// A missing control is the normal case and is not reported. A control that is
/// present but fails to click is logged and recorded; it never aborts the run.
pub async fn clear_obstacles(session: &mut impl Session, pacing: &Pacing) -> ObstacleReport {
    let mut report = ObstacleReport::default();

    for (name, selector) in CONTROLS.iter() {
        let Some(control) = session.locate_first(selector) else {
            continue;
        };

        debug!("Clearing obstacle '{}' ({})", name, control.describe());
        match session.click(&control).await {
            Ok(()) => {
                report.cleared.push(name.to_string());
                pacing.after_navigation().await;
            }
            Err(err) => {
                let err = ScrapeError::ObstacleUnresolved {
                    control: name.to_string(),
                    reason: err.to_string(),
                };
                warn!("{}", err);
                report.unresolved.push(err.to_string());
            }
        }
    }

    report
}
