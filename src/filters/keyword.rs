//! Keyword-based review text filtering.

use super::Filter;
use crate::amazon::models::Review;

/// Filters reviews by keywords in the title or body.
pub struct KeywordFilter {
    /// Keywords that must appear in the review.
    required: Vec<String>,
    /// Keywords that must NOT appear in the review.
    excluded: Vec<String>,
}

impl KeywordFilter {
    /// Creates a new keyword filter.
    pub fn new(required: Vec<String>, excluded: Vec<String>) -> Self {
        Self {
            required: required.into_iter().map(|k| k.to_lowercase()).collect(),
            excluded: excluded.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Creates a filter with only required keywords.
    pub fn required(keywords: Vec<String>) -> Self {
        Self::new(keywords, Vec::new())
    }

    /// Creates a filter with only excluded keywords.
    pub fn excluded(keywords: Vec<String>) -> Self {
        Self::new(Vec::new(), keywords)
    }
}

impl Filter for KeywordFilter {
    fn matches(&self, review: &Review) -> bool {
        let haystack = match &review.title {
            Some(title) => format!("{} {}", title, review.text).to_lowercase(),
            None => review.text.to_lowercase(),
        };

        if self.required.iter().any(|k| !haystack.contains(k.as_str())) {
            return false;
        }

        !self.excluded.iter().any(|k| haystack.contains(k.as_str()))
    }

    fn description(&self) -> String {
        let mut parts = Vec::new();

        if !self.required.is_empty() {
            parts.push(format!("Must contain: {}", self.required.join(", ")));
        }

        if !self.excluded.is_empty() {
            parts.push(format!("Must not contain: {}", self.excluded.join(", ")));
        }

        if parts.is_empty() {
            "Keywords: any".to_string()
        } else {
            parts.join("; ")
        }
    }
}
