//! Review filtering system with composable filters.

pub mod keyword;
pub mod rating;
pub mod sentiment;

use crate::amazon::models::{Review, Sentiment};

pub use keyword::KeywordFilter;
pub use rating::RatingFilter;
pub use sentiment::SentimentFilter;

/// Trait for filtering reviews.
pub trait Filter: Send + Sync {
    /// Returns true if the review passes the filter.
    fn matches(&self, review: &Review) -> bool;

    /// Returns a description of this filter.
    fn description(&self) -> String;
}

/// A chain of filters that must all pass.
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    /// Creates an empty filter chain.
    pub fn new() -> Self {
        Self { filters: Vec::new() }
    }

    /// Adds a filter to the chain.
    pub fn add(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Checks if a review passes all filters.
    pub fn matches(&self, review: &Review) -> bool {
        self.filters.iter().all(|f| f.matches(review))
    }

    /// Returns the reviews that pass, in their original order.
    pub fn apply<'a>(&self, reviews: &'a [Review]) -> Vec<&'a Review> {
        reviews.iter().filter(|r| self.matches(r)).collect()
    }

    /// Returns true if no filters are configured.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Returns the number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns descriptions of all filters.
    pub fn descriptions(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.description()).collect()
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing a FilterChain from CLI options.
pub struct FilterChainBuilder {
    chain: FilterChain,
}

impl FilterChainBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self { chain: FilterChain::new() }
    }

    /// Keeps only reviews with exactly this many stars.
    pub fn rating(mut self, stars: Option<u8>) -> Self {
        if let Some(stars) = stars {
            self.chain.add(RatingFilter::exact(stars));
        }
        self
    }

    /// Keeps only reviews with at least this many stars.
    pub fn min_rating(mut self, stars: Option<u8>) -> Self {
        if let Some(stars) = stars {
            self.chain.add(RatingFilter::at_least(stars));
        }
        self
    }

    /// Keeps only reviews with this sentiment label.
    pub fn sentiment(mut self, sentiment: Option<Sentiment>) -> Self {
        if let Some(sentiment) = sentiment {
            self.chain.add(SentimentFilter::new(sentiment));
        }
        self
    }

    /// Adds required keywords filter.
    pub fn keywords(mut self, keywords: Vec<String>) -> Self {
        if !keywords.is_empty() {
            self.chain.add(KeywordFilter::required(keywords));
        }
        self
    }

    /// Adds excluded keywords filter.
    pub fn exclude_keywords(mut self, keywords: Vec<String>) -> Self {
        if !keywords.is_empty() {
            self.chain.add(KeywordFilter::excluded(keywords));
        }
        self
    }

    /// Builds the filter chain.
    pub fn build(self) -> FilterChain {
        self.chain
    }
}

impl Default for FilterChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}
