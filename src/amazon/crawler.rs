//! Review list pagination.

use crate::amazon::dates;
use crate::amazon::extract::{
    self, REVIEW_BLOCKS, REVIEW_BLOCKS_ALTERNATE, REVIEW_DATE, REVIEW_RATING, REVIEW_TEXT,
    REVIEW_TITLE,
};
use crate::amazon::models::{Histogram, PushOutcome, Review, ReviewCollection};
use crate::amazon::obstacles::{clear_obstacles, ObstacleReport};
use crate::amazon::pacing::Pacing;
use crate::amazon::session::Session;
use crate::analysis::sentiment::Classifier;
use crate::error::ScrapeError;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, trace, warn};

/// Why a crawl stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum StopReason {
    /// The collection reached its capacity
    Full,
    /// A page had no review blocks
    NoBlocks,
    /// No usable next-page control on the last page
    NoNextPage,
    /// The page budget ran out
    PageLimit,
    /// Navigating to the next page failed
    Navigation(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Full => write!(f, "review limit reached"),
            StopReason::NoBlocks => write!(f, "no review blocks on page"),
            StopReason::NoNextPage => write!(f, "no next page"),
            StopReason::PageLimit => write!(f, "page limit reached"),
            StopReason::Navigation(reason) => write!(f, "navigation failed: {}", reason),
        }
    }
}

/// Result of a crawl.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub reviews: ReviewCollection,
    /// Last histogram seen on a review page (empty if none was)
    pub histogram: Histogram,
    pub pages_visited: u32,
    pub stop_reason: StopReason,
    /// Blocks that yielded no usable review
    pub skipped_blocks: usize,
    /// Prompts cleared on pages reached by pagination
    pub obstacles: ObstacleReport,
}

/// Everything read from one review page snapshot.
#[derive(Debug, Default)]
struct PageScan {
    blocks: usize,
    reviews: Vec<Review>,
    histogram: Option<Histogram>,
    skipped: usize,
}

/// Walks review list pages, collecting classified reviews.
pub struct ReviewCrawler<'a> {
    classifier: &'a Classifier,
    pacing: Pacing,
}

impl<'a> ReviewCrawler<'a> {
    pub fn new(classifier: &'a Classifier, pacing: Pacing) -> Self {
        Self { classifier, pacing }
    }

    /// Crawls from the session's current page until a termination condition holds.
    ///
    /// Conditions are checked in order after each page: collection full, page had no
    /// blocks, no next-page control, page budget spent. A failed navigation to the
    /// next page also ends the crawl; whatever was collected so far is kept.
    pub async fn crawl_reviews(
        &self,
        session: &mut impl Session,
        max_reviews: usize,
        max_pages: u32,
    ) -> CrawlOutcome {
        self.crawl_into(session, ReviewCollection::new(max_reviews), max_pages).await
    }

    /// Like [`crawl_reviews`](Self::crawl_reviews), filling a caller-configured
    /// collection (for example one with a per-star quota).
    pub async fn crawl_into(
        &self,
        session: &mut impl Session,
        mut reviews: ReviewCollection,
        max_pages: u32,
    ) -> CrawlOutcome {
        let mut histogram = Histogram::new();
        let mut obstacles = ObstacleReport::default();
        let mut skipped_blocks = 0;
        let mut page = 0;

        let stop_reason = loop {
            page += 1;
            let scan = self.scan_page(&session.snapshot(), page == 1);
            debug!("Review page {}: {} blocks, {} reviews", page, scan.blocks, scan.reviews.len());

            if let Some(h) = scan.histogram {
                histogram = h;
            }
            skipped_blocks += scan.skipped;

            for review in scan.reviews {
                let star = review.rating;
                match reviews.push(review) {
                    PushOutcome::Appended => {}
                    PushOutcome::TooShort => trace!("Dropped review shorter than minimum length"),
                    PushOutcome::StarFull => trace!("Dropped {}-star review, quota reached", star),
                    PushOutcome::Full => break,
                }
            }

            if reviews.is_full() {
                break StopReason::Full;
            }
            if scan.blocks == 0 {
                break StopReason::NoBlocks;
            }
            let Some(next) = extract::NEXT_PAGE.locate(&*session) else {
                break StopReason::NoNextPage;
            };
            if page >= max_pages {
                break StopReason::PageLimit;
            }

            match session.click(&next).await {
                Ok(()) => {}
                Err(err) if err.is_navigation_failure() => {
                    warn!("Stopping crawl after page {}: {}", page, err);
                    break StopReason::Navigation(err.to_string());
                }
                Err(err) => {
                    warn!("Next-page control on page {} is unusable: {}", page, err);
                    break StopReason::NoNextPage;
                }
            }
            self.pacing.after_navigation().await;
            obstacles.merge(clear_obstacles(session, &self.pacing).await);
        };

        info!(
            "Crawl finished: {} reviews from {} pages ({})",
            reviews.len(),
            page,
            stop_reason
        );

        CrawlOutcome {
            reviews,
            histogram,
            pages_visited: page,
            stop_reason,
            skipped_blocks,
            obstacles,
        }
    }

    /// Parses one snapshot. Kept synchronous so the parsed document never crosses an await.
    fn scan_page(&self, html: &str, first_page: bool) -> PageScan {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let mut blocks = REVIEW_BLOCKS.select(root);
        if blocks.is_empty() && first_page {
            debug!("No review blocks under the primary selectors, trying alternates");
            blocks = REVIEW_BLOCKS_ALTERNATE.select(root);
        }

        let mut scan = PageScan {
            blocks: blocks.len(),
            histogram: extract::HISTOGRAM.extract(root).ok(),
            ..Default::default()
        };

        for (index, block) in blocks.into_iter().enumerate() {
            match self.parse_block(index, block) {
                Ok(review) => scan.reviews.push(review),
                Err(err) => {
                    debug!("{}", err);
                    scan.skipped += 1;
                }
            }
        }

        scan
    }

    fn parse_block(&self, index: usize, block: ElementRef<'_>) -> Result<Review, ScrapeError> {
        let text = REVIEW_TEXT.extract(block).map_err(|err| ScrapeError::BlockParse {
            index,
            reason: err.to_string(),
        })?;

        let rating = REVIEW_RATING.extract(block).ok();
        let date = REVIEW_DATE.extract(block).ok().and_then(|raw| dates::normalize(&raw));
        let title = REVIEW_TITLE.extract(block).ok();
        let (polarity, sentiment) = self.classifier.classify(&text);
        trace!("Block {}: rating {:?}, {}", index, rating, sentiment);

        Ok(Review::new(rating, text, date, polarity).with_title(title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amazon::session::{locate_in, Element};
    use crate::amazon::models::Sentiment;
    use crate::error::SessionError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use scraper::Selector;

    /// Serves a list of pages. A click on a link moves to the next one; a click on
    /// anything else is an in-page button and only gets recorded.
    struct Pages {
        pages: Vec<String>,
        current: usize,
        fail_navigation: bool,
        dead_links: bool,
        clicked: Vec<String>,
    }

    impl Pages {
        fn new(pages: Vec<String>) -> Self {
            Self { pages, current: 0, fail_navigation: false, dead_links: false, clicked: Vec::new() }
        }
    }

    #[async_trait]
    impl Session for Pages {
        async fn open(&mut self, _url: &str) -> Result<(), SessionError> {
            Ok(())
        }

        fn snapshot(&self) -> String {
            self.pages[self.current].clone()
        }

        fn current_url(&self) -> Option<String> {
            Some(format!("/product-reviews/B0TEST0001/?pageNumber={}", self.current + 1))
        }

        fn locate(&self, selector: &Selector) -> Vec<Element> {
            locate_in(&self.pages[self.current], selector)
        }

        async fn click(&mut self, element: &Element) -> Result<(), SessionError> {
            self.clicked.push(element.describe());
            if element.href().is_none() {
                return Ok(());
            }
            if self.dead_links {
                return Err(SessionError::NotInteractive { element: element.describe() });
            }
            if self.fail_navigation || self.current + 1 >= self.pages.len() {
                return Err(SessionError::PageUnreachable {
                    url: "next".to_string(),
                    reason: "status 500".to_string(),
                });
            }
            self.current += 1;
            Ok(())
        }

        async fn type_text(&mut self, _: &Element, _: &str) -> Result<(), SessionError> {
            Ok(())
        }

        async fn execute_script(
            &mut self,
            _: &str,
            _: &[Element],
        ) -> Result<serde_json::Value, SessionError> {
            Err(SessionError::Unsupported("execute_script"))
        }

        async fn close(&mut self) -> Result<(), SessionError> {
            Ok(())
        }
    }

    fn block(stars: u8, text: &str) -> String {
        format!(
            r#"<div data-hook="review">
                 <i data-hook="review-star-rating"><span class="a-icon-alt">{stars}.0 out of 5 stars</span></i>
                 <span data-hook="review-date">Reviewed in India on 12 March 2024</span>
                 <span data-hook="review-body"><span>{text}</span></span>
               </div>"#
        )
    }

    fn page(blocks: usize, next: bool) -> String {
        let body: String = (0..blocks).map(|i| block(5, &format!("great product number {}", i))).collect();
        let next = if next { r#"<ul><li class="a-last"><a href="/next">Next</a></li></ul>"# } else { "" };
        format!("<html><body>{}{}</body></html>", body, next)
    }

    fn crawl(session: &mut Pages, max_reviews: usize, max_pages: u32) -> CrawlOutcome {
        let classifier = Classifier::keyword();
        let crawler = ReviewCrawler::new(&classifier, Pacing::disabled());
        tokio_test::block_on(crawler.crawl_reviews(session, max_reviews, max_pages))
    }

    #[test]
    fn test_stops_when_full() {
        let mut session = Pages::new(vec![page(6, true), page(6, true), page(6, true)]);
        let outcome = crawl(&mut session, 10, 10);
        assert_eq!(outcome.pages_visited, 2);
        assert_eq!(outcome.reviews.len(), 10);
        assert_eq!(outcome.stop_reason, StopReason::Full);
    }

    #[test]
    fn test_stops_without_next_control() {
        let mut session = Pages::new(vec![page(3, true), page(2, false)]);
        let outcome = crawl(&mut session, 100, 10);
        assert_eq!(outcome.pages_visited, 2);
        assert_eq!(outcome.reviews.len(), 5);
        assert_eq!(outcome.stop_reason, StopReason::NoNextPage);
    }

    #[test]
    fn test_stops_on_empty_page() {
        let mut session = Pages::new(vec![page(2, true), page(0, true)]);
        let outcome = crawl(&mut session, 100, 10);
        assert_eq!(outcome.stop_reason, StopReason::NoBlocks);
        assert_eq!(outcome.reviews.len(), 2);
    }

    #[test]
    fn test_stops_at_page_budget() {
        let mut session = Pages::new(vec![page(1, true), page(1, true), page(1, true)]);
        let outcome = crawl(&mut session, 100, 2);
        assert_eq!(outcome.pages_visited, 2);
        assert_eq!(outcome.stop_reason, StopReason::PageLimit);
    }

    #[test]
    fn test_navigation_failure_keeps_collected_reviews() {
        let mut session = Pages::new(vec![page(4, true), page(4, true)]);
        session.fail_navigation = true;
        let outcome = crawl(&mut session, 100, 10);
        assert_eq!(outcome.reviews.len(), 4);
        assert!(matches!(outcome.stop_reason, StopReason::Navigation(_)));
    }

    #[test]
    fn test_short_texts_are_dropped() {
        let html = format!(
            "<html><body>{}{}{}</body></html>",
            block(1, "bad"),
            block(4, "good"),
            block(2, "ok")
        );
        let mut session = Pages::new(vec![html]);
        let outcome = crawl(&mut session, 100, 10);
        assert_eq!(outcome.reviews.len(), 1);
        assert_eq!(outcome.reviews.as_slice()[0].text, "good");
        assert_eq!(outcome.reviews.as_slice()[0].rating, 4);
    }

    #[test]
    fn test_block_fields_are_normalized() {
        let mut session = Pages::new(vec![page(1, false)]);
        let outcome = crawl(&mut session, 10, 10);
        let review = &outcome.reviews.as_slice()[0];
        assert_eq!(review.rating, 5);
        assert_eq!(review.date, NaiveDate::from_ymd_opt(2024, 3, 12));
        assert_eq!(review.sentiment, Sentiment::Positive);
    }

    #[test]
    fn test_alternate_blocks_on_first_page() {
        let html = r#"<html><body>
            <div class="review"><span class="review-text">Works as expected, decent value</span></div>
        </body></html>"#;
        let mut session = Pages::new(vec![html.to_string()]);
        let outcome = crawl(&mut session, 10, 10);
        assert_eq!(outcome.reviews.len(), 1);
        assert_eq!(outcome.reviews.as_slice()[0].rating, 3);
        assert_eq!(outcome.stop_reason, StopReason::NoNextPage);
    }

    #[test]
    fn test_histogram_from_review_page() {
        let html = format!(
            r#"<html><body>
                <span data-hook="histogram-bar-label">5 star</span>
                <span data-hook="histogram-bar-percentage">100%</span>
                {}</body></html>"#,
            block(5, "really great sound")
        );
        let mut session = Pages::new(vec![html]);
        let outcome = crawl(&mut session, 10, 10);
        assert_eq!(outcome.histogram.percent(5), 100);
    }

    #[test]
    fn test_prompts_cleared_on_paginated_pages() {
        let second = format!(
            r#"<html><body>
                <input type="submit" data-action-type="DISMISS" value="Dismiss">
                {}</body></html>"#,
            block(4, "decent earbuds overall")
        );
        let mut session = Pages::new(vec![page(2, true), second]);
        let outcome = crawl(&mut session, 10, 5);

        assert_eq!(outcome.pages_visited, 2);
        assert_eq!(outcome.reviews.len(), 3);
        assert_eq!(outcome.obstacles.cleared, vec!["dismiss"]);
        assert!(outcome.obstacles.unresolved.is_empty());
        // The next link, then the prompt on page 2
        assert_eq!(session.clicked.len(), 2);
    }

    #[test]
    fn test_first_page_prompts_left_to_caller() {
        let first = format!(
            r#"<html><body><input data-action-type="DISMISS" value="Dismiss">{}</body></html>"#,
            block(5, "great product here")
        );
        let mut session = Pages::new(vec![first]);
        let outcome = crawl(&mut session, 10, 5);
        assert!(outcome.obstacles.cleared.is_empty());
        assert!(session.clicked.is_empty());
    }

    #[test]
    fn test_unusable_next_control_ends_crawl() {
        let mut session = Pages::new(vec![page(2, true), page(2, true)]);
        session.dead_links = true;
        let outcome = crawl(&mut session, 100, 10);
        assert_eq!(outcome.reviews.len(), 2);
        assert_eq!(outcome.stop_reason, StopReason::NoNextPage);
    }

    #[test]
    fn test_star_quota_samples_evenly() {
        let html = format!(
            "<html><body>{}{}{}{}</body></html>",
            block(5, "great sound one"),
            block(5, "great sound two"),
            block(1, "awful fit, hurts"),
            block(5, "great sound three")
        );
        let mut session = Pages::new(vec![html]);
        let classifier = Classifier::keyword();
        let crawler = ReviewCrawler::new(&classifier, Pacing::disabled());
        let collection = ReviewCollection::new(100).with_star_quota(2);

        let outcome = tokio_test::block_on(crawler.crawl_into(&mut session, collection, 10));

        assert_eq!(outcome.reviews.len(), 3);
        assert_eq!(outcome.reviews.count_for(5), 2);
        assert_eq!(outcome.reviews.count_for(1), 1);
        assert_eq!(outcome.stop_reason, StopReason::NoNextPage);
    }
}
