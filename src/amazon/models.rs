//! Data models for products, reviews and rating histograms.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Rating used when a review block carries no recoverable star rating.
pub const DEFAULT_REVIEW_RATING: u8 = 3;

/// Shortest review text (in characters) kept in a collection.
pub const MIN_REVIEW_TEXT_LEN: usize = 4;

/// Title substituted when no title strategy matches.
pub const TITLE_NOT_FOUND: &str = "Title not found";

/// Shown in place of a price no strategy could read.
pub const PRICE_NOT_FOUND: &str = "Price not found";

/// Product-level facts read from the detail and review pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product title
    pub title: String,
    /// Amazon Standard Identification Number, when it could be recovered
    pub asin: Option<String>,
    /// Product page URL
    pub url: Option<String>,
    /// Displayed price text without the currency symbol, e.g. "1,299"
    #[serde(default)]
    pub price: Option<String>,
    /// Average star rating shown on the page
    pub global_rating: Option<f32>,
    /// Total number of ratings shown on the page
    pub global_review_count: Option<u32>,
    /// Star -> percent histogram
    pub histogram: Histogram,
}

/// Three-bucket polarity label shared by every sentiment backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Labels a polarity score: `>= 0.05` positive, `<= -0.05` negative.
    pub fn from_polarity(score: f64) -> Self {
        if score >= 0.05 {
            Sentiment::Positive
        } else if score <= -0.05 {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "Positive"),
            Sentiment::Neutral => write!(f, "Neutral"),
            Sentiment::Negative => write!(f, "Negative"),
        }
    }
}

impl std::str::FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "positive" | "pos" => Ok(Sentiment::Positive),
            "neutral" | "neu" => Ok(Sentiment::Neutral),
            "negative" | "neg" => Ok(Sentiment::Negative),
            _ => Err(format!("Unknown sentiment: {}. Use: positive, neutral, negative", s)),
        }
    }
}

/// A single review captured from a review list page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Star rating, 1-5
    pub rating: u8,
    /// Review headline, if the block had one
    pub title: Option<String>,
    /// Review body
    pub text: String,
    /// Normalized review date
    pub date: Option<NaiveDate>,
    /// Polarity label derived from `polarity`
    pub sentiment: Sentiment,
    /// Backend polarity score
    pub polarity: f64,
}

impl Review {
    /// Builds a review, defaulting missing or out-of-range ratings to 3.
    pub fn new(
        rating: Option<u8>,
        text: impl Into<String>,
        date: Option<NaiveDate>,
        polarity: f64,
    ) -> Self {
        let rating = match rating {
            Some(r @ 1..=5) => r,
            _ => DEFAULT_REVIEW_RATING,
        };

        Self {
            rating,
            title: None,
            text: text.into(),
            date,
            sentiment: Sentiment::from_polarity(polarity),
            polarity,
        }
    }

    /// Attaches a review headline.
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title.filter(|t| !t.is_empty());
        self
    }

    /// True if the text satisfies the minimum-length rule.
    pub fn has_valid_text(&self) -> bool {
        self.text.trim().chars().count() >= MIN_REVIEW_TEXT_LEN
    }
}

/// Outcome of offering a review to a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Appended,
    TooShort,
    /// The review's star already holds its per-star quota
    StarFull,
    Full,
}

/// Append-only, bounded, insertion-ordered review list.
///
/// With a per-star quota the collection samples evenly across ratings: a review is
/// refused once its star holds `per_star` reviews, and the collection counts as full
/// when every star does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewCollection {
    max_size: usize,
    #[serde(default)]
    per_star: Option<usize>,
    reviews: Vec<Review>,
}

impl ReviewCollection {
    /// Creates an empty collection that holds at most `max_size` reviews.
    pub fn new(max_size: usize) -> Self {
        Self { max_size, per_star: None, reviews: Vec::new() }
    }

    /// Caps each star rating at `per_star` reviews.
    pub fn with_star_quota(mut self, per_star: usize) -> Self {
        self.per_star = Some(per_star);
        self
    }

    /// Appends a review unless it is too short, its star is at quota or the
    /// collection is full.
    pub fn push(&mut self, review: Review) -> PushOutcome {
        if self.is_full() {
            return PushOutcome::Full;
        }
        if !review.has_valid_text() {
            return PushOutcome::TooShort;
        }
        if self.per_star.is_some_and(|quota| self.count_for(review.rating) >= quota) {
            return PushOutcome::StarFull;
        }
        self.reviews.push(review);
        PushOutcome::Appended
    }

    /// Returns true once `max_size` reviews are held, or every star is at quota.
    pub fn is_full(&self) -> bool {
        if self.reviews.len() >= self.max_size {
            return true;
        }
        match self.per_star {
            Some(quota) => (1..=5).all(|star| self.count_for(star) >= quota),
            None => false,
        }
    }

    /// Number of held reviews with the given star rating.
    pub fn count_for(&self, star: u8) -> usize {
        self.reviews.iter().filter(|r| r.rating == star).count()
    }

    pub fn per_star(&self) -> Option<usize> {
        self.per_star
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Review> {
        self.reviews.iter()
    }

    pub fn as_slice(&self) -> &[Review] {
        &self.reviews
    }
}

impl<'a> IntoIterator for &'a ReviewCollection {
    type Item = &'a Review;
    type IntoIter = std::slice::Iter<'a, Review>;

    fn into_iter(self) -> Self::IntoIter {
        self.reviews.iter()
    }
}

/// Star -> percent mapping as displayed on the page. May be partial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram(BTreeMap<u8, u32>);

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a histogram from (star, percent) pairs, dropping invalid entries.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u8, u32)>) -> Self {
        let mut histogram = Self::new();
        for (star, percent) in pairs {
            histogram.insert(star, percent);
        }
        histogram
    }

    /// Records a bucket. Stars outside 1-5 and percents above 100 are ignored.
    pub fn insert(&mut self, star: u8, percent: u32) -> bool {
        if !(1..=5).contains(&star) || percent > 100 {
            return false;
        }
        self.0.insert(star, percent);
        true
    }

    /// Percent for a star; missing stars read as 0.
    pub fn percent(&self, star: u8) -> u32 {
        self.0.get(&star).copied().unwrap_or(0)
    }

    /// Sum of all recorded percents.
    pub fn total_percent(&self) -> u32 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(text: &str) -> Review {
        Review::new(Some(5), text, None, 0.5)
    }

    #[test]
    fn test_sentiment_threshold_boundaries() {
        assert_eq!(Sentiment::from_polarity(0.05), Sentiment::Positive);
        assert_eq!(Sentiment::from_polarity(0.049999), Sentiment::Neutral);
        assert_eq!(Sentiment::from_polarity(-0.05), Sentiment::Negative);
        assert_eq!(Sentiment::from_polarity(-0.049999), Sentiment::Neutral);
        assert_eq!(Sentiment::from_polarity(0.0), Sentiment::Neutral);
        assert_eq!(Sentiment::from_polarity(1.0), Sentiment::Positive);
    }

    #[test]
    fn test_sentiment_parsing() {
        assert_eq!("positive".parse::<Sentiment>().unwrap(), Sentiment::Positive);
        assert_eq!("NEG".parse::<Sentiment>().unwrap(), Sentiment::Negative);
        assert!("meh".parse::<Sentiment>().is_err());
        assert_eq!(Sentiment::Neutral.to_string(), "Neutral");
    }

    #[test]
    fn test_review_rating_defaults() {
        assert_eq!(Review::new(None, "fine product", None, 0.0).rating, 3);
        assert_eq!(Review::new(Some(0), "fine product", None, 0.0).rating, 3);
        assert_eq!(Review::new(Some(9), "fine product", None, 0.0).rating, 3);
        assert_eq!(Review::new(Some(1), "fine product", None, 0.0).rating, 1);
    }

    #[test]
    fn test_review_label_follows_polarity() {
        assert_eq!(Review::new(Some(4), "great", None, 0.6).sentiment, Sentiment::Positive);
        assert_eq!(Review::new(Some(4), "awful", None, -0.6).sentiment, Sentiment::Negative);
    }

    #[test]
    fn test_collection_rejects_short_text() {
        let mut reviews = ReviewCollection::new(10);
        assert_eq!(reviews.push(review("ok!")), PushOutcome::TooShort);
        assert_eq!(reviews.push(review("  ab ")), PushOutcome::TooShort);
        assert_eq!(reviews.push(review("good")), PushOutcome::Appended);
        assert_eq!(reviews.len(), 1);
    }

    #[test]
    fn test_collection_is_bounded() {
        let mut reviews = ReviewCollection::new(2);
        assert_eq!(reviews.push(review("first review")), PushOutcome::Appended);
        assert_eq!(reviews.push(review("second review")), PushOutcome::Appended);
        assert!(reviews.is_full());
        assert_eq!(reviews.push(review("third review")), PushOutcome::Full);
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews.as_slice()[0].text, "first review");
    }

    #[test]
    fn test_star_quota_balances_sample() {
        let mut reviews = ReviewCollection::new(100).with_star_quota(2);
        let five = |text: &str| Review::new(Some(5), text, None, 0.5);
        let one = |text: &str| Review::new(Some(1), text, None, -0.5);

        assert_eq!(reviews.push(five("great one")), PushOutcome::Appended);
        assert_eq!(reviews.push(five("great two")), PushOutcome::Appended);
        assert_eq!(reviews.push(five("great three")), PushOutcome::StarFull);
        assert_eq!(reviews.push(one("awful one")), PushOutcome::Appended);

        assert_eq!(reviews.count_for(5), 2);
        assert_eq!(reviews.count_for(1), 1);
        assert!(!reviews.is_full());
    }

    #[test]
    fn test_star_quota_full_when_every_star_filled() {
        let mut reviews = ReviewCollection::new(100).with_star_quota(1);
        for star in 1..=5 {
            assert_eq!(reviews.push(Review::new(Some(star), "some text", None, 0.0)), PushOutcome::Appended);
        }
        assert!(reviews.is_full());
        assert_eq!(reviews.push(Review::new(Some(3), "more text", None, 0.0)), PushOutcome::Full);
    }

    #[test]
    fn test_histogram_partial_and_invalid() {
        let histogram = Histogram::from_pairs([(5, 60), (4, 20), (6, 10), (1, 150)]);
        assert_eq!(histogram.len(), 2);
        assert_eq!(histogram.percent(5), 60);
        assert_eq!(histogram.percent(3), 0);
        assert_eq!(histogram.total_percent(), 80);
    }

    #[test]
    fn test_histogram_serde() {
        let histogram = Histogram::from_pairs([(5, 70), (1, 30)]);
        let json = serde_json::to_string(&histogram).unwrap();
        assert_eq!(json, r#"{"1":30,"5":70}"#);
        let parsed: Histogram = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, histogram);
    }
}
