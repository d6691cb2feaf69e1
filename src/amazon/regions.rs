//! Amazon storefronts and their URL layout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Storefronts whose review pages share the product-detail + review-list layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    In,
    Us,
    Uk,
    Ca,
    Au,
    De,
    Fr,
    Es,
    It,
}

impl Region {
    /// Returns the Amazon domain for this region.
    pub fn domain(&self) -> &'static str {
        match self {
            Region::In => "amazon.in",
            Region::Us => "amazon.com",
            Region::Uk => "amazon.co.uk",
            Region::Ca => "amazon.ca",
            Region::Au => "amazon.com.au",
            Region::De => "amazon.de",
            Region::Fr => "amazon.fr",
            Region::Es => "amazon.es",
            Region::It => "amazon.it",
        }
    }

    /// Returns the storefront home page.
    pub fn base_url(&self) -> String {
        format!("https://www.{}", self.domain())
    }

    /// Returns the Accept-Language header value for this region.
    pub fn accept_language(&self) -> &'static str {
        match self {
            Region::In => "en-IN,en;q=0.9,hi;q=0.8",
            Region::Us | Region::Ca => "en-US,en;q=0.9",
            Region::Uk => "en-GB,en;q=0.9",
            Region::Au => "en-AU,en;q=0.9",
            Region::De => "de-DE,de;q=0.9,en;q=0.8",
            Region::Fr => "fr-FR,fr;q=0.9,en;q=0.8",
            Region::Es => "es-ES,es;q=0.9,en;q=0.8",
            Region::It => "it-IT,it;q=0.9,en;q=0.8",
        }
    }

    /// Returns all supported regions.
    pub fn all() -> &'static [Region] {
        &[
            Region::In,
            Region::Us,
            Region::Uk,
            Region::Ca,
            Region::Au,
            Region::De,
            Region::Fr,
            Region::Es,
            Region::It,
        ]
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Region::In => "in",
            Region::Us => "us",
            Region::Uk => "uk",
            Region::Ca => "ca",
            Region::Au => "au",
            Region::De => "de",
            Region::Fr => "fr",
            Region::Es => "es",
            Region::It => "it",
        };
        write!(f, "{}", code)
    }
}

impl FromStr for Region {
    type Err = RegionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "in" | "india" => Ok(Region::In),
            "us" | "usa" | "united states" => Ok(Region::Us),
            "uk" | "gb" | "united kingdom" => Ok(Region::Uk),
            "ca" | "canada" => Ok(Region::Ca),
            "au" | "australia" => Ok(Region::Au),
            "de" | "germany" => Ok(Region::De),
            "fr" | "france" => Ok(Region::Fr),
            "es" | "spain" => Ok(Region::Es),
            "it" | "italy" => Ok(Region::It),
            _ => Err(RegionParseError(s.to_string())),
        }
    }
}

/// Search results path for a free-text query. Same layout on every storefront.
pub fn search_path(query: &str) -> String {
    format!("/s?k={}", urlencoding::encode(query.trim()))
}

/// Review list path for an ASIN, used when the product page offers no review link.
pub fn reviews_path(asin: &str, page: u32) -> String {
    format!("/product-reviews/{}/?pageNumber={}", asin, page)
}

#[derive(Debug, Clone, Error)]
#[error("Unknown region '{0}'. Valid regions: in, us, uk, ca, au, de, fr, es, it")]
pub struct RegionParseError(String);
