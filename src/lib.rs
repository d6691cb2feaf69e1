//! amz-reviews - Resilient Amazon review crawler with sentiment analytics
//!
//! Finds a product from a free-text query, walks its review pages with ordered
//! fallback extraction strategies, and reconciles the page's rating histogram with
//! the sampled review text into sentiment, keyword and trend analytics.

pub mod amazon;
pub mod analysis;
pub mod commands;
pub mod config;
pub mod error;
pub mod filters;
pub mod format;
pub mod sink;

pub use amazon::models::{Histogram, Product, Review, ReviewCollection, Sentiment};
pub use amazon::regions::Region;
pub use analysis::AnalyticsResult;
pub use config::Config;
pub use error::{ScrapeError, SessionError};
