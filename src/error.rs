//! Error taxonomy for sessions, extraction and the analysis pipeline.
//!
//! Only `SessionCreation`, `NoProduct`, `NoReviews` and navigation failures on the
//! product page end a run. Everything else is a recorded degradation.

use crate::amazon::extract::FieldKind;
use thiserror::Error;

/// Failures raised by a navigation session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Page unreachable: {url} ({reason})")]
    PageUnreachable { url: String, reason: String },

    #[error("Rate limited while loading {url}. Try increasing --delay or using a proxy.")]
    RateLimited { url: String },

    #[error("Blocked by anti-automation page at {url}: {reason}")]
    Blocked { url: String, reason: String },

    #[error("Element <{element}> cannot be interacted with")]
    NotInteractive { element: String },

    #[error("Operation not supported by this session: {0}")]
    Unsupported(&'static str),

    #[error("Session is closed")]
    Closed,
}

impl SessionError {
    /// True for failures that mean the page itself could not be loaded.
    pub fn is_navigation_failure(&self) -> bool {
        matches!(
            self,
            SessionError::PageUnreachable { .. }
                | SessionError::RateLimited { .. }
                | SessionError::Blocked { .. }
        )
    }
}

/// Errors surfaced by the scraping pipeline.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Failed to create navigation session: {0}")]
    SessionCreation(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Could not clear obstacle '{control}': {reason}")]
    ObstacleUnresolved { control: String, reason: String },

    #[error("Field not found: {0}")]
    FieldNotFound(FieldKind),

    #[error("Failed to parse review block #{index}: {reason}")]
    BlockParse { index: usize, reason: String },

    #[error("No product found for query '{query}'")]
    NoProduct { query: String },

    #[error("No reviews scraped for query '{query}'")]
    NoReviews { query: String },
}

impl ScrapeError {
    /// Process exit code for this error. Zero scraped reviews is distinct from failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ScrapeError::NoReviews { .. } => 2,
            _ => 1,
        }
    }
}
