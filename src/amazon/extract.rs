//! Field extraction through ordered fallback strategies.
//!
//! Every logical field (title, rating, histogram, ...) has a [`FieldChain`]: a static,
//! priority-ordered table of strategies plus an acceptance check. Strategies run in
//! declaration order and the first accepted value wins, so when several markup
//! generations match the same page the earliest registered one decides.
//!
//! Strategies are plain functions over an `ElementRef` scope. Document-level chains
//! receive `document.root_element()`; block-level chains receive the review block.

use crate::amazon::models::Histogram;
use crate::amazon::selectors::{histogram, product, reviews, search};
use crate::amazon::session::{collapse_whitespace, Element, Session};
use crate::error::ScrapeError;
use regex_lite::Regex;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use tracing::trace;

/// Logical fields the extractor knows how to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Title,
    Price,
    GlobalRating,
    ReviewCount,
    Histogram,
    Asin,
    ProductLink,
    ReviewsLink,
    SearchBox,
    ReviewBlocks,
    ReviewRating,
    ReviewText,
    ReviewDate,
    ReviewTitle,
    NextPage,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Title => "title",
            FieldKind::Price => "price",
            FieldKind::GlobalRating => "global rating",
            FieldKind::ReviewCount => "review count",
            FieldKind::Histogram => "histogram",
            FieldKind::Asin => "asin",
            FieldKind::ProductLink => "product link",
            FieldKind::ReviewsLink => "reviews link",
            FieldKind::SearchBox => "search box",
            FieldKind::ReviewBlocks => "review blocks",
            FieldKind::ReviewRating => "review rating",
            FieldKind::ReviewText => "review text",
            FieldKind::ReviewDate => "review date",
            FieldKind::ReviewTitle => "review title",
            FieldKind::NextPage => "next page",
        };
        write!(f, "{}", name)
    }
}

/// One way of locating and parsing a field.
pub struct Strategy<T> {
    /// Name used in logs
    pub name: &'static str,
    /// Locate-then-parse step; `None` means "no match here"
    pub run: fn(ElementRef<'_>) -> Option<T>,
}

/// Ordered strategies for one field plus the shape check a value must pass.
pub struct FieldChain<T: 'static> {
    pub kind: FieldKind,
    pub strategies: &'static [Strategy<T>],
    pub accept: fn(&T) -> bool,
}

impl<T> FieldChain<T> {
    /// Returns the first accepted value, trying strategies in order.
    pub fn extract(&self, scope: ElementRef<'_>) -> Result<T, ScrapeError> {
        self.extract_traced(scope).map(|(value, _)| value)
    }

    /// Like [`extract`](Self::extract), also naming the strategy that won.
    pub fn extract_traced(&self, scope: ElementRef<'_>) -> Result<(T, &'static str), ScrapeError> {
        for strategy in self.strategies {
            match (strategy.run)(scope) {
                Some(value) if (self.accept)(&value) => {
                    trace!("{}: matched by '{}'", self.kind, strategy.name);
                    return Ok((value, strategy.name));
                }
                Some(_) => trace!("{}: '{}' rejected by shape check", self.kind, strategy.name),
                None => trace!("{}: '{}' found nothing", self.kind, strategy.name),
            }
        }
        Err(ScrapeError::FieldNotFound(self.kind))
    }
}

/// Ordered selectors for elements that are located rather than parsed
/// (review blocks, controls on a live session).
pub struct LocatorChain {
    pub kind: FieldKind,
    pub selectors: &'static [&'static LazyLock<Selector>],
}

impl LocatorChain {
    /// Elements matched by the first selector that matches anything.
    pub fn select<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        for selector in self.selectors {
            let found: Vec<_> = scope.select(selector).collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// First element on the session's current page matched by the chain.
    pub fn locate(&self, session: &impl Session) -> Option<Element> {
        self.selectors.iter().find_map(|selector| session.locate_first(selector))
    }
}

// ---------------------------------------------------------------------------
// Value parsers
// ---------------------------------------------------------------------------

static DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").unwrap());
static STAR_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d)\s*star").unwrap());
static FIRST_INT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static ARIA_BUCKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,3})\s*(?:%|percent).*?(\d)\s*star").unwrap());
static ASIN_IN_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:dp|gp/product|product-reviews)/([A-Z0-9]{10})(?:[/?#]|$)").unwrap()
});

/// Whitespace-collapsed text of an element.
pub fn text_of(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Text of the first non-empty match of `selector` inside `scope`.
fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope.select(selector).map(text_of).find(|t| !t.is_empty())
}

/// Strips the currency symbol and the dangling separator of a whole-part price:
/// "₹1,299.00" gives "1,299.00" and "1,299." gives "1,299".
pub fn price_digits(text: &str) -> String {
    text.trim_matches(|c: char| !c.is_ascii_digit()).to_string()
}

/// Parses "4.1 out of 5 stars" or "4,1 von 5 Sternen" into 4.1.
pub fn parse_rating(text: &str) -> Option<f32> {
    DECIMAL.find(text)?.as_str().replace(',', ".").parse().ok()
}

/// Parses "12,345 global ratings" into 12345.
pub fn parse_count(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Parses "61%" into 61.
pub fn parse_percent(text: &str) -> Option<u32> {
    let cleaned = text.trim().trim_end_matches('%').trim();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    cleaned.parse().ok()
}

/// Parses a histogram row label ("5 star", "5 stars") into the star number.
pub fn parse_star_label(text: &str) -> Option<u8> {
    if let Some(caps) = STAR_LABEL.captures(text) {
        return caps[1].parse().ok();
    }
    FIRST_INT.find(text)?.as_str().parse().ok()
}

/// Extracts an ASIN from a product, review or legacy product URL.
pub fn asin_from_url(url: &str) -> Option<String> {
    ASIN_IN_URL.captures(url).map(|caps| caps[1].to_string())
}

/// Unwraps sponsored redirect links (`...?url=%2Fdp%2F...`) and drops tracking params.
pub fn real_product_link(href: &str) -> Option<String> {
    if href.is_empty() {
        return None;
    }

    let parsed = url::Url::parse(href)
        .or_else(|_| url::Url::parse("https://placeholder.invalid").and_then(|b| b.join(href)))
        .ok()?;

    if let Some((_, target)) = parsed.query_pairs().find(|(k, _)| k == "url") {
        return Some(strip_query(&target));
    }

    Some(strip_query(href))
}

fn strip_query(href: &str) -> String {
    href.split('?').next().unwrap_or(href).to_string()
}

fn looks_like_product(href: &str) -> bool {
    href.contains("/dp/") || href.contains("/gp/")
}

// ---------------------------------------------------------------------------
// Acceptance checks
// ---------------------------------------------------------------------------

fn non_empty(value: &String) -> bool {
    !value.trim().is_empty()
}

fn has_digit(value: &String) -> bool {
    value.chars().any(|c| c.is_ascii_digit())
}

fn valid_rating(value: &f32) -> bool {
    (0.0..=5.0).contains(value)
}

fn any_count(_: &u32) -> bool {
    true
}

fn valid_star(value: &u8) -> bool {
    (1..=5).contains(value)
}

/// Non-empty and sums to about 100 (display rounding allows a little slack).
fn plausible_histogram(value: &Histogram) -> bool {
    !value.is_empty() && value.total_percent() <= 105
}

fn valid_asin(value: &String) -> bool {
    value.len() == 10 && value.chars().all(|c| c.is_ascii_alphanumeric())
}

// ---------------------------------------------------------------------------
// Product page chains
// ---------------------------------------------------------------------------

pub static TITLE: FieldChain<String> = FieldChain {
    kind: FieldKind::Title,
    strategies: &[
        Strategy { name: "#productTitle", run: |s| first_text(s, &product::TITLE) },
        Strategy { name: "#title span", run: |s| first_text(s, &product::TITLE_WRAPPER) },
        Strategy { name: "span.a-size-large", run: |s| first_text(s, &product::TITLE_LARGE) },
    ],
    accept: non_empty,
};

pub static PRICE: FieldChain<String> = FieldChain {
    kind: FieldKind::Price,
    strategies: &[
        Strategy {
            name: "a-price-whole",
            run: |s| first_text(s, &product::PRICE_WHOLE).map(|t| price_digits(&t)),
        },
        Strategy {
            name: "a-offscreen",
            run: |s| first_text(s, &product::PRICE_OFFSCREEN).map(|t| price_digits(&t)),
        },
    ],
    accept: has_digit,
};

pub static GLOBAL_RATING: FieldChain<f32> = FieldChain {
    kind: FieldKind::GlobalRating,
    strategies: &[
        Strategy {
            name: "rating-out-of-text",
            run: |s| first_text(s, &product::RATING_OUT_OF).and_then(|t| parse_rating(&t)),
        },
        Strategy {
            name: "#acrPopover",
            run: |s| first_text(s, &product::RATING_POPOVER).and_then(|t| parse_rating(&t)),
        },
        Strategy {
            name: "star icon",
            run: |s| first_text(s, &product::RATING_ICON).and_then(|t| parse_rating(&t)),
        },
    ],
    accept: valid_rating,
};

pub static REVIEW_COUNT: FieldChain<u32> = FieldChain {
    kind: FieldKind::ReviewCount,
    strategies: &[
        Strategy {
            name: "#acrCustomerReviewText",
            run: |s| first_text(s, &product::REVIEW_COUNT).and_then(|t| parse_count(&t)),
        },
        Strategy {
            name: "total-review-count",
            run: |s| first_text(s, &product::TOTAL_REVIEW_COUNT).and_then(|t| parse_count(&t)),
        },
        Strategy {
            name: "#acrCustomerReviewLink span",
            run: |s| first_text(s, &product::REVIEW_COUNT_LINK).and_then(|t| parse_count(&t)),
        },
    ],
    accept: any_count,
};

pub static HISTOGRAM: FieldChain<Histogram> = FieldChain {
    kind: FieldKind::Histogram,
    strategies: &[
        Strategy { name: "histogram-bar", run: histogram_from_bars },
        Strategy { name: "histogramTable", run: histogram_from_table },
        Strategy { name: "compact spans", run: histogram_from_compact },
        Strategy { name: "aria-label", run: histogram_from_aria },
    ],
    accept: plausible_histogram,
};

pub static ASIN: FieldChain<String> = FieldChain {
    kind: FieldKind::Asin,
    strategies: &[
        Strategy {
            name: "input[name=ASIN]",
            run: |s| {
                s.select(&product::ASIN_INPUT)
                    .find_map(|e| e.value().attr("value"))
                    .map(|v| v.trim().to_string())
            },
        },
        Strategy {
            name: "canonical link",
            run: |s| {
                s.select(&product::CANONICAL)
                    .find_map(|e| e.value().attr("href"))
                    .and_then(asin_from_url)
            },
        },
    ],
    accept: valid_asin,
};

pub static REVIEWS_LINK: FieldChain<String> = FieldChain {
    kind: FieldKind::ReviewsLink,
    strategies: &[Strategy {
        name: "see all reviews",
        run: |s| {
            s.select(&product::REVIEWS_LINK)
                .filter_map(|e| e.value().attr("href"))
                .find(|h| !h.starts_with('#') && !h.starts_with("javascript:"))
                .map(String::from)
        },
    }],
    accept: non_empty,
};

fn histogram_from_bars(scope: ElementRef<'_>) -> Option<Histogram> {
    let mut result = Histogram::new();
    for bar in scope.select(&histogram::BAR) {
        let star = bar.select(&histogram::BAR_LABEL).next().map(text_of);
        let percent = bar.select(&histogram::BAR_PERCENT).next().map(text_of);
        if let (Some(star), Some(percent)) = (star, percent) {
            if let (Some(star), Some(percent)) = (parse_star_label(&star), parse_percent(&percent)) {
                result.insert(star, percent);
            }
        }
    }
    Some(result)
}

fn histogram_from_table(scope: ElementRef<'_>) -> Option<Histogram> {
    let mut result = Histogram::new();
    for row in scope.select(&histogram::TABLE_ROW) {
        let Some(label) = row.select(&histogram::ROW_LABEL).next().map(text_of) else {
            continue;
        };
        let Some(star) = STAR_LABEL.captures(&label).and_then(|c| c[1].parse::<u8>().ok()) else {
            continue;
        };
        let percent = row
            .select(&histogram::ROW_PERCENT)
            .next()
            .map(text_of)
            .and_then(|t| parse_count(&t));
        if let Some(percent) = percent {
            result.insert(star, percent);
        }
    }
    Some(result)
}

fn histogram_from_compact(scope: ElementRef<'_>) -> Option<Histogram> {
    let labels: Vec<_> = scope.select(&histogram::COMPACT_LABEL).map(text_of).collect();
    let percents: Vec<_> = scope.select(&histogram::COMPACT_PERCENT).map(text_of).collect();
    if labels.is_empty() || labels.len() != percents.len() {
        return None;
    }

    let mut result = Histogram::new();
    for (label, percent) in labels.iter().zip(&percents) {
        if let (Some(star), Some(percent)) = (parse_star_label(label), parse_percent(percent)) {
            result.insert(star, percent);
        }
    }
    Some(result)
}

fn histogram_from_aria(scope: ElementRef<'_>) -> Option<Histogram> {
    let mut result = Histogram::new();
    for link in scope.select(&histogram::ARIA_LINK) {
        let Some(label) = link.value().attr("aria-label") else {
            continue;
        };
        if let Some(caps) = ARIA_BUCKET.captures(label) {
            if let (Ok(percent), Ok(star)) = (caps[1].parse::<u32>(), caps[2].parse::<u8>()) {
                result.insert(star, percent);
            }
        }
    }
    Some(result)
}

// ---------------------------------------------------------------------------
// Search results chain
// ---------------------------------------------------------------------------

pub static PRODUCT_LINK: FieldChain<String> = FieldChain {
    kind: FieldKind::ProductLink,
    strategies: &[
        Strategy {
            name: "organic result link",
            run: |s| {
                s.select(&search::RESULT_LINK)
                    .filter_map(|e| e.value().attr("href"))
                    .find(|h| !h.contains("/slredirect/"))
                    .and_then(real_product_link)
            },
        },
        Strategy {
            name: "legacy result link",
            run: |s| {
                s.select(&search::RESULT_LINK_LEGACY)
                    .filter_map(|e| e.value().attr("href"))
                    .filter_map(real_product_link)
                    .find(|h| looks_like_product(h))
            },
        },
        Strategy {
            name: "any text link",
            run: |s| {
                s.select(&search::RESULT_LINK_BROAD)
                    .filter_map(|e| e.value().attr("href"))
                    .filter(|h| !h.contains("/slredirect/"))
                    .filter_map(real_product_link)
                    .find(|h| looks_like_product(h))
            },
        },
    ],
    accept: non_empty,
};

pub static SEARCH_BOX: LocatorChain =
    LocatorChain { kind: FieldKind::SearchBox, selectors: &[&search::SEARCH_BOX] };

// ---------------------------------------------------------------------------
// Review page chains
// ---------------------------------------------------------------------------

pub static REVIEW_BLOCKS: LocatorChain =
    LocatorChain { kind: FieldKind::ReviewBlocks, selectors: &[&reviews::BLOCK] };

pub static REVIEW_BLOCKS_ALTERNATE: LocatorChain =
    LocatorChain { kind: FieldKind::ReviewBlocks, selectors: &[&reviews::BLOCK_ALTERNATE] };

pub static NEXT_PAGE: LocatorChain = LocatorChain {
    kind: FieldKind::NextPage,
    selectors: &[&reviews::NEXT_PAGE, &reviews::NEXT_PAGE_ARIA],
};

pub static REVIEW_RATING: FieldChain<u8> = FieldChain {
    kind: FieldKind::ReviewRating,
    strategies: &[
        Strategy {
            name: "review-star-rating",
            run: |s| first_text(s, &reviews::STAR_RATING).and_then(|t| star_from_text(&t)),
        },
        Strategy {
            name: "a-star class",
            run: |s| {
                s.select(&reviews::STAR_CLASS).find_map(|e| {
                    e.value()
                        .classes()
                        .find_map(|c| c.strip_prefix("a-star-"))
                        .and_then(|n| n.split('-').next())
                        .and_then(|n| n.parse().ok())
                })
            },
        },
        Strategy {
            name: "any a-icon-alt",
            run: |s| first_text(s, &reviews::STAR_RATING_ANY).and_then(|t| star_from_text(&t)),
        },
    ],
    accept: valid_star,
};

pub static REVIEW_TEXT: FieldChain<String> = FieldChain {
    kind: FieldKind::ReviewText,
    strategies: &[
        Strategy { name: "review-body span", run: |s| first_text(s, &reviews::BODY) },
        Strategy { name: "review-body", run: |s| first_text(s, &reviews::BODY_DIRECT) },
        Strategy { name: "review-text", run: |s| first_text(s, &reviews::BODY_LEGACY) },
        Strategy { name: "block text", run: |s| Some(text_of(s)) },
    ],
    accept: non_empty,
};

pub static REVIEW_DATE: FieldChain<String> = FieldChain {
    kind: FieldKind::ReviewDate,
    strategies: &[Strategy { name: "review-date", run: |s| first_text(s, &reviews::DATE) }],
    accept: non_empty,
};

pub static REVIEW_TITLE: FieldChain<String> = FieldChain {
    kind: FieldKind::ReviewTitle,
    strategies: &[Strategy {
        name: "review-title",
        run: |s| {
            s.select(&reviews::TITLE)
                .map(text_of)
                .filter(|t| !t.is_empty() && !t.contains("out of 5"))
                .last()
        },
    }],
    accept: non_empty,
};

/// Star count from "4.0 out of 5 stars" (truncated to an integer star).
fn star_from_text(text: &str) -> Option<u8> {
    parse_rating(text).map(|r| r.trunc() as u8)
}
