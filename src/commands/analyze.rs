//! Review analysis command: find a product, crawl its reviews, analyse them.

use crate::amazon::extract::{self, asin_from_url, FieldChain, FieldKind};
use crate::amazon::models::{Product, Review, ReviewCollection, TITLE_NOT_FOUND};
use crate::amazon::obstacles::clear_obstacles;
use crate::amazon::regions::{reviews_path, search_path};
use crate::amazon::session::ENTER;
use crate::amazon::{HttpSession, Pacing, ReviewCrawler, Session};
use crate::analysis::{build_result, AnalyticsResult, Classifier, Diagnostics, ResultCache};
use crate::config::Config;
use crate::error::ScrapeError;
use crate::filters::FilterChain;
use crate::format::Formatter;
use crate::sink::{FileSink, Sink};
use anyhow::{Context, Result};
use scraper::Html;
use tracing::{debug, info, warn};

/// Lazy-loaded reviews only render once the page is scrolled.
const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Runs the full analysis pipeline for free-text product queries.
pub struct AnalyzeCommand {
    config: Config,
    classifier: Classifier,
    filters: FilterChain,
    cache: ResultCache,
}

impl AnalyzeCommand {
    /// Creates the command, loading the configured sentiment backend.
    pub fn new(config: Config) -> Result<Self> {
        let classifier =
            Classifier::from_settings(config.sentiment_backend, config.lexicon_path.as_deref())
                .context("Failed to load sentiment lexicon")?;
        debug!("Sentiment backend: {}", classifier.backend_name());

        let cache = ResultCache::new(config.cache_capacity, config.cache_ttl());
        Ok(Self { config, classifier, filters: FilterChain::new(), cache })
    }

    /// Narrows the reviews shown in the output. Analytics always use the full sample.
    pub fn with_filters(mut self, filters: FilterChain) -> Self {
        self.filters = filters;
        self
    }

    /// Analyses a query over a fresh HTTP session and returns formatted output.
    pub async fn execute(&self, query: &str) -> Result<String> {
        let query = validate_query(query)?;

        if let Some(cached) = self.cache.get(query) {
            info!("Using cached analysis for '{}'", query);
            return Ok(self.render(&cached));
        }

        let mut session = HttpSession::new(&self.config)?;
        self.execute_with_session(&mut session, query).await
    }

    /// Analyses a query with a provided session (for testing).
    pub async fn execute_with_session(
        &self,
        session: &mut impl Session,
        query: &str,
    ) -> Result<String> {
        let query = validate_query(query)?;

        let result = match self.cache.get(query) {
            Some(cached) => {
                info!("Using cached analysis for '{}'", query);
                close_session(session).await;
                cached
            }
            None => {
                let result = self.analyze(session, query).await?;
                self.persist(&result)?;
                self.cache.put(query, result.clone());
                result
            }
        };

        Ok(self.render(&result))
    }

    /// Runs the pipeline and closes the session on every path.
    pub async fn analyze(
        &self,
        session: &mut impl Session,
        query: &str,
    ) -> Result<AnalyticsResult, ScrapeError> {
        let outcome = self.run_pipeline(session, query).await;
        close_session(session).await;
        outcome
    }

    async fn run_pipeline(
        &self,
        session: &mut impl Session,
        query: &str,
    ) -> Result<AnalyticsResult, ScrapeError> {
        info!("Analysing reviews for: {}", query);
        let pacing = Pacing::from_config(&self.config);
        if pacing.is_disabled() {
            debug!("Pacing disabled, navigating without delays");
        }
        let mut diagnostics = Diagnostics {
            sentiment_backend: self.classifier.backend_name().to_string(),
            ..Diagnostics::default()
        };

        session.open("/").await?;
        pacing.after_navigation().await;
        diagnostics.obstacles.merge(clear_obstacles(session, &pacing).await);

        search(session, &pacing, query, &mut diagnostics).await?;
        diagnostics.obstacles.merge(clear_obstacles(session, &pacing).await);

        let product_link = extract_from(&session.snapshot(), &extract::PRODUCT_LINK)
            .map_err(|_| ScrapeError::NoProduct { query: query.to_string() })?;
        debug!("First product link: {}", product_link);

        session.open(&product_link).await?;
        pacing.after_navigation().await;
        diagnostics.obstacles.merge(clear_obstacles(session, &pacing).await);

        if let Err(err) = session.execute_script(SCROLL_SCRIPT, &[]).await {
            debug!("Scroll script failed: {}", err);
            diagnostics.notes.push(format!("scroll skipped: {}", err));
        }

        let mut product = parse_product(
            &session.snapshot(),
            session.current_url(),
            &mut diagnostics.defaulted_fields,
        );
        info!("Product: {}", product.title);

        open_reviews(session, &pacing, &product, &mut diagnostics).await;
        diagnostics.obstacles.merge(clear_obstacles(session, &pacing).await);

        let mut collection = ReviewCollection::new(self.config.max_reviews);
        if let Some(quota) = self.config.max_per_star {
            debug!("Sampling at most {} reviews per star", quota);
            collection = collection.with_star_quota(quota);
        }

        let crawler = ReviewCrawler::new(&self.classifier, pacing);
        let outcome = crawler.crawl_into(session, collection, self.config.max_pages).await;
        diagnostics.obstacles.merge(outcome.obstacles);
        if !diagnostics.obstacles.is_clean() {
            warn!("Unresolved prompts: {}", diagnostics.obstacles.unresolved.join("; "));
        }

        if !outcome.histogram.is_empty() {
            product.histogram = outcome.histogram;
            diagnostics.defaulted_fields.retain(|f| *f != FieldKind::Histogram);
        }
        diagnostics.pages_visited = outcome.pages_visited;
        diagnostics.skipped_blocks = outcome.skipped_blocks;
        diagnostics.stop_reason = Some(outcome.stop_reason);

        if outcome.reviews.is_empty() {
            return Err(ScrapeError::NoReviews { query: query.to_string() });
        }

        Ok(build_result(query, product, outcome.reviews, diagnostics, self.config.top_keywords))
    }

    fn persist(&self, result: &AnalyticsResult) -> Result<()> {
        let Some(dir) = &self.config.output_dir else {
            return Ok(());
        };

        let mut sink = FileSink::new(dir)?;
        sink.append_reviews(&result.reviews)?;
        sink.write_document(result)?;
        info!("Saved analysis to {}", dir.display());
        Ok(())
    }

    fn render(&self, result: &AnalyticsResult) -> String {
        let shown: Vec<&Review> = self.filters.apply(&result.reviews);
        if !self.filters.is_empty() {
            debug!("Active filters: {}", self.filters.descriptions().join(", "));
        }

        Formatter::new(self.config.format)
            .with_filters(self.filters.descriptions())
            .format_result(result, &shown)
    }
}

fn validate_query(query: &str) -> Result<&str> {
    let query = query.trim();
    if query.is_empty() {
        anyhow::bail!("Search query must not be empty");
    }
    Ok(query)
}

async fn close_session(session: &mut impl Session) {
    if let Err(err) = session.close().await {
        warn!("Failed to close session: {}", err);
    }
}

/// Types the query into the search box like a user would. Falls back to opening the
/// search results URL when the box is missing or typing fails.
async fn search(
    session: &mut impl Session,
    pacing: &Pacing,
    query: &str,
    diagnostics: &mut Diagnostics,
) -> Result<(), ScrapeError> {
    let typed = match extract::SEARCH_BOX.locate(&*session) {
        Some(search_box) => type_query(session, pacing, &search_box, query).await,
        None => Err(ScrapeError::FieldNotFound(FieldKind::SearchBox)),
    };

    if let Err(err) = typed {
        warn!("Search box unusable ({}), opening results directly", err);
        diagnostics.notes.push(format!("search box unusable: {}", err));
        session.open(&search_path(query)).await?;
    }

    pacing.after_navigation().await;
    Ok(())
}

async fn type_query(
    session: &mut impl Session,
    pacing: &Pacing,
    search_box: &crate::amazon::Element,
    query: &str,
) -> Result<(), ScrapeError> {
    for ch in query.chars() {
        session.type_text(search_box, &ch.to_string()).await?;
        pacing.after_keystroke().await;
    }
    session.type_text(search_box, &ENTER.to_string()).await?;
    Ok(())
}

/// Runs a chain over a page snapshot. The parsed document never outlives the call.
fn extract_from<T: 'static>(html: &str, chain: &FieldChain<T>) -> Result<T, ScrapeError> {
    chain.extract(Html::parse_document(html).root_element())
}

/// Extracts product facts from a snapshot, recording every field that fell back.
fn parse_product(html: &str, url: Option<String>, defaulted: &mut Vec<FieldKind>) -> Product {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut missing = |err: ScrapeError, kind: FieldKind| {
        warn!("{}, using default", err);
        defaulted.push(kind);
    };

    let title = extract::TITLE.extract(root).unwrap_or_else(|err| {
        missing(err, FieldKind::Title);
        TITLE_NOT_FOUND.to_string()
    });
    let price = extract::PRICE
        .extract(root)
        .map_err(|err| missing(err, FieldKind::Price))
        .ok();
    let global_rating = extract::GLOBAL_RATING
        .extract(root)
        .map_err(|err| missing(err, FieldKind::GlobalRating))
        .ok();
    let global_review_count = extract::REVIEW_COUNT
        .extract(root)
        .map_err(|err| missing(err, FieldKind::ReviewCount))
        .ok();
    let histogram = extract::HISTOGRAM.extract(root).unwrap_or_else(|err| {
        missing(err, FieldKind::Histogram);
        Default::default()
    });

    let asin = extract::ASIN.extract(root).ok().or_else(|| url.as_deref().and_then(asin_from_url));

    Product { title, asin, url, price, global_rating, global_review_count, histogram }
}

/// Moves to the review list. On failure the crawl runs on the product page itself,
/// which shows its top reviews.
async fn open_reviews(
    session: &mut impl Session,
    pacing: &Pacing,
    product: &Product,
    diagnostics: &mut Diagnostics,
) {
    let link = extract_from(&session.snapshot(), &extract::REVIEWS_LINK);

    let target = match (link, &product.asin) {
        (Ok(href), _) => href,
        (Err(_), Some(asin)) => {
            debug!("No reviews link, building the review list path from the ASIN");
            reviews_path(asin, 1)
        }
        (Err(_), None) => {
            diagnostics.notes.push("no review list link; crawling product page".to_string());
            return;
        }
    };

    match session.open(&target).await {
        Ok(()) => pacing.after_navigation().await,
        Err(err) => {
            warn!("Could not open review list ({}), crawling product page", err);
            diagnostics.notes.push(format!("review list unreachable: {}", err));
        }
    }
}
