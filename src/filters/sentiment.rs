//! Sentiment label filter.

use super::Filter;
use crate::amazon::models::{Review, Sentiment};

/// Keeps reviews carrying one sentiment label.
pub struct SentimentFilter {
    sentiment: Sentiment,
}

impl SentimentFilter {
    pub fn new(sentiment: Sentiment) -> Self {
        Self { sentiment }
    }
}

impl Filter for SentimentFilter {
    fn matches(&self, review: &Review) -> bool {
        review.sentiment == self.sentiment
    }

    fn description(&self) -> String {
        format!("Sentiment: {}", self.sentiment)
    }
}
