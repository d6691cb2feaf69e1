//! Star rating filter.

use super::Filter;
use crate::amazon::models::Review;

/// Filters reviews by star rating, either exactly or as a minimum.
pub struct RatingFilter {
    stars: u8,
    exact: bool,
}

impl RatingFilter {
    /// Keeps reviews with exactly `stars` stars.
    pub fn exact(stars: u8) -> Self {
        Self { stars: stars.clamp(1, 5), exact: true }
    }

    /// Keeps reviews with at least `stars` stars.
    pub fn at_least(stars: u8) -> Self {
        Self { stars: stars.clamp(1, 5), exact: false }
    }
}

impl Filter for RatingFilter {
    fn matches(&self, review: &Review) -> bool {
        if self.exact {
            review.rating == self.stars
        } else {
            review.rating >= self.stars
        }
    }

    fn description(&self) -> String {
        if self.exact {
            format!("Rating: {} stars", self.stars)
        } else {
            format!("Rating: >= {} stars", self.stars)
        }
    }
}
