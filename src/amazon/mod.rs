//! Amazon-specific modules: navigation session, field extraction and review crawling.

pub mod client;
pub mod crawler;
pub mod dates;
pub mod extract;
pub mod models;
pub mod obstacles;
pub mod pacing;
pub mod regions;
pub mod selectors;
pub mod session;

pub use client::HttpSession;
pub use crawler::{CrawlOutcome, ReviewCrawler, StopReason};
pub use extract::FieldKind;
pub use models::{Histogram, Product, Review, ReviewCollection, Sentiment};
pub use pacing::Pacing;
pub use regions::Region;
pub use session::{Element, Session};
