//! Analytics result types.

use crate::amazon::crawler::StopReason;
use crate::amazon::extract::FieldKind;
use crate::amazon::models::{Product, Review, Sentiment};
use crate::amazon::obstacles::ObstacleReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Positive / neutral / negative bucket counts.
///
/// Signed so the reconciler's drift correction can be represented as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
}

impl SentimentCounts {
    pub fn total(&self) -> i64 {
        self.positive + self.neutral + self.negative
    }

    /// Counts the per-review labels of a sample.
    pub fn from_reviews(reviews: &[Review]) -> Self {
        reviews.iter().fold(Self::default(), |mut counts, review| {
            match review.sentiment {
                Sentiment::Positive => counts.positive += 1,
                Sentiment::Neutral => counts.neutral += 1,
                Sentiment::Negative => counts.negative += 1,
            }
            counts
        })
    }

    pub fn get(&self, sentiment: Sentiment) -> i64 {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
        }
    }
}

/// How the headline sentiment counts were derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// From the page's rating histogram
    Histogram,
    /// Fixed 70/20/10 split; no histogram was available
    Heuristic,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Histogram => write!(f, "histogram"),
            Confidence::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// A ranked TF-IDF term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub term: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

/// Average rating of the reviews dated in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// `YYYY-MM`
    pub month: String,
    pub average_rating: f64,
    pub reviews: usize,
}

/// Non-fatal degradations recorded during a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub obstacles: ObstacleReport,
    /// Product fields that fell back to their default
    pub defaulted_fields: Vec<FieldKind>,
    pub skipped_blocks: usize,
    pub pages_visited: u32,
    pub stop_reason: Option<StopReason>,
    pub sentiment_backend: String,
    /// Non-fatal messages (failed scripts, fallback navigation)
    pub notes: Vec<String>,
}

/// Everything produced by one analysis run. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsResult {
    pub query: String,
    pub generated_at: DateTime<Utc>,
    pub product: Product,
    pub reviews: Vec<Review>,
    /// Headline counts, summing to the review total
    pub sentiment_counts: SentimentCounts,
    pub confidence: Confidence,
    /// Labels of the scraped sample itself
    pub sample_sentiment: SentimentCounts,
    /// Star -> number of sampled reviews
    pub rating_counts: BTreeMap<u8, usize>,
    pub top_keywords: Vec<Keyword>,
    pub word_frequencies: Vec<WordCount>,
    pub rating_trend: Vec<TrendPoint>,
    pub diagnostics: Diagnostics,
}

impl AnalyticsResult {
    /// Mean rating of the sampled reviews.
    pub fn sample_average_rating(&self) -> Option<f64> {
        if self.reviews.is_empty() {
            return None;
        }
        let sum: u32 = self.reviews.iter().map(|r| u32::from(r.rating)).sum();
        Some(f64::from(sum) / self.reviews.len() as f64)
    }
}

/// Per-star counts over a sample, with every star present.
pub fn rating_counts(reviews: &[Review]) -> BTreeMap<u8, usize> {
    let mut counts: BTreeMap<u8, usize> = (1..=5).map(|star| (star, 0)).collect();
    for review in reviews {
        *counts.entry(review.rating).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_sentiment_counts() {
        let reviews = vec![
            Review::new(Some(5), "great stuff", None, 0.8),
            Review::new(Some(1), "awful stuff", None, -0.8),
            Review::new(Some(3), "it exists", None, 0.0),
            Review::new(Some(4), "nice stuff", None, 0.3),
        ];
        let counts = SentimentCounts::from_reviews(&reviews);
        assert_eq!(counts, SentimentCounts { positive: 2, neutral: 1, negative: 1 });
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.get(Sentiment::Positive), 2);
    }

    #[test]
    fn test_rating_counts_cover_all_stars() {
        let reviews = vec![
            Review::new(Some(5), "great stuff", None, 0.8),
            Review::new(Some(5), "great stuff", None, 0.8),
            Review::new(None, "defaulted", None, 0.0),
        ];
        let counts = rating_counts(&reviews);
        assert_eq!(counts.len(), 5);
        assert_eq!(counts[&5], 2);
        assert_eq!(counts[&3], 1);
        assert_eq!(counts[&1], 0);
    }

    #[test]
    fn test_confidence_serde() {
        assert_eq!(serde_json::to_string(&Confidence::Heuristic).unwrap(), "\"heuristic\"");
        assert_eq!(Confidence::Histogram.to_string(), "histogram");
    }
}
