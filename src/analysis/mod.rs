//! Review analytics: sentiment scoring, histogram reconciliation, keywords and trends.

pub mod cache;
pub mod keywords;
pub mod models;
pub mod reconcile;
pub mod sentiment;
pub mod trend;

pub use cache::ResultCache;
pub use models::{AnalyticsResult, Confidence, Diagnostics, SentimentCounts};
pub use reconcile::{reconcile, Reconciled};
pub use sentiment::{Classifier, SentimentBackend};

use crate::amazon::models::{Product, ReviewCollection};
use tracing::debug;

/// Assembles the final result from the product facts and the crawled sample.
///
/// The reconciliation total is the page's global review count when known, otherwise
/// the sample size.
pub fn build_result(
    query: &str,
    product: Product,
    reviews: ReviewCollection,
    diagnostics: Diagnostics,
    top_keywords: usize,
) -> AnalyticsResult {
    let reviews = reviews.as_slice().to_vec();
    let total = product.global_review_count.unwrap_or(reviews.len() as u32);
    let reconciled = reconcile(Some(&product.histogram), total);
    let text = keywords::aggregate(&reviews, top_keywords);
    debug!(
        "Reconciled {} reviews ({}): {:?}",
        total, reconciled.confidence, reconciled.counts
    );

    AnalyticsResult {
        query: query.to_string(),
        generated_at: chrono::Utc::now(),
        sentiment_counts: reconciled.counts,
        confidence: reconciled.confidence,
        sample_sentiment: SentimentCounts::from_reviews(&reviews),
        rating_counts: models::rating_counts(&reviews),
        top_keywords: text.top_keywords,
        word_frequencies: text.word_frequencies,
        rating_trend: trend::rating_trend(&reviews),
        product,
        reviews,
        diagnostics,
    }
}
