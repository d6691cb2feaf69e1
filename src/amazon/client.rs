//! HTTP-backed navigation session using wreq for TLS fingerprint emulation.
//!
//! Clicking a link follows its href and clicking a form control submits the form, so
//! the search box, consent prompts and review pagination all work without a browser.
//! Scripts cannot run here; `execute_script` reports `Unsupported`.

use crate::amazon::regions::Region;
use crate::amazon::selectors::errors;
use crate::amazon::session::{locate_in, Element, FormTarget, Session, ENTER};
use crate::config::Config;
use crate::error::{ScrapeError, SessionError};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;
use wreq::Client;
use wreq_util::Emulation;

/// Page currently loaded in the session.
struct Page {
    url: Url,
    html: String,
}

/// Navigation session over plain HTTP with browser impersonation.
pub struct HttpSession {
    client: Client,
    region: Region,
    base_url: Option<String>,
    page: Option<Page>,
    /// Values typed into fields of the current page, submitted with its form
    typed: Vec<(String, String)>,
    closed: bool,
}

impl HttpSession {
    /// Creates a session for the configured region.
    pub fn new(config: &Config) -> Result<Self, ScrapeError> {
        Self::with_base_url(config, None)
    }

    /// Creates a session with an optional custom base URL (for testing).
    pub fn with_base_url(config: &Config, base_url: Option<String>) -> Result<Self, ScrapeError> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url)
                .map_err(|e| ScrapeError::SessionCreation(format!("invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| ScrapeError::SessionCreation(e.to_string()))?;

        // There is no browser window to hide or show; the flag is only reported.
        debug!("HTTP session created (headless={})", config.headless);

        Ok(Self {
            client,
            region: config.region,
            base_url,
            page: None,
            typed: Vec::new(),
            closed: false,
        })
    }

    /// Storefront home page (custom for testing, or region-based for production).
    pub fn home_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| self.region.base_url())
    }

    /// Resolves `target` against the current page, or the home page before any navigation.
    fn resolve(&self, target: &str) -> Result<Url, SessionError> {
        let unreachable = |reason: String| SessionError::PageUnreachable {
            url: target.to_string(),
            reason,
        };

        let base = match &self.page {
            Some(page) => page.url.clone(),
            None => Url::parse(&self.home_url()).map_err(|e| unreachable(e.to_string()))?,
        };
        base.join(target).map_err(|e| unreachable(e.to_string()))
    }

    /// Performs a GET request with browser emulation headers and loads the result.
    async fn fetch(&mut self, url: Url) -> Result<(), SessionError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.as_str())
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8")
            .header("Accept-Language", self.region.accept_language())
            .header("Accept-Encoding", "gzip, deflate, br")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Sec-Ch-Ua", "\"Chromium\";v=\"131\", \"Not_A Brand\";v=\"24\"")
            .header("Sec-Ch-Ua-Mobile", "?0")
            .header("Sec-Ch-Ua-Platform", "\"macOS\"")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Sec-Fetch-User", "?1")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .map_err(|e| SessionError::PageUnreachable {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 503 {
            warn!("Rate limited (503). Consider using a proxy or increasing delay.");
            return Err(SessionError::RateLimited { url: url.to_string() });
        }

        if !status.is_success() {
            return Err(SessionError::PageUnreachable {
                url: url.to_string(),
                reason: format!("status {}", status),
            });
        }

        let final_url = Url::parse(&response.uri().to_string()).unwrap_or_else(|_| url.clone());
        if self.base_url.is_none() && !final_url.as_str().contains(self.region.domain()) {
            warn!(
                "Redirected to different domain: {}. Your IP may be associated with a different region.",
                final_url
            );
        }

        let html = response.text().await.map_err(|e| SessionError::PageUnreachable {
            url: url.to_string(),
            reason: format!("failed to read body: {}", e),
        })?;

        if let Some(reason) = detect_block_page(&html) {
            return Err(SessionError::Blocked { url: final_url.to_string(), reason: reason.to_string() });
        }

        self.page = Some(Page { url: final_url, html });
        self.typed.clear();
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    async fn submit(&mut self, form: &FormTarget, extra: &[(String, String)]) -> Result<(), SessionError> {
        let mut overrides = self.typed.clone();
        overrides.extend_from_slice(extra);
        let target = form.submission_url(&overrides);
        let target = if form.action.is_empty() {
            // An empty action submits to the current page
            let current = self.page.as_ref().map(|p| p.url.path().to_string()).unwrap_or_default();
            format!("{}{}", current, target)
        } else {
            target
        };
        self.open(&target).await
    }
}

/// Names the anti-automation page the HTML represents, if any.
fn detect_block_page(html: &str) -> Option<&'static str> {
    let document = Html::parse_document(html);
    if document.select(&errors::CAPTCHA).next().is_some() {
        return Some("captcha challenge");
    }
    if document.select(&errors::DOG_PAGE).next().is_some() {
        return Some("service unavailable page");
    }
    None
}

#[async_trait]
impl Session for HttpSession {
    async fn open(&mut self, url: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        let url = self.resolve(url)?;
        info!("Opening {}", url);
        self.fetch(url).await
    }

    fn snapshot(&self) -> String {
        self.page.as_ref().map(|p| p.html.clone()).unwrap_or_default()
    }

    fn current_url(&self) -> Option<String> {
        self.page.as_ref().map(|p| p.url.to_string())
    }

    fn locate(&self, selector: &Selector) -> Vec<Element> {
        match &self.page {
            Some(page) => locate_in(&page.html, selector),
            None => Vec::new(),
        }
    }

    async fn click(&mut self, element: &Element) -> Result<(), SessionError> {
        self.ensure_open()?;

        if let Some(href) = element.href() {
            let href = href.to_string();
            return self.open(&href).await;
        }

        if let Some(form) = &element.form {
            // A named submit control contributes its own value
            let extra: Vec<_> = match (element.attr("name"), element.attr("value")) {
                (Some(name), Some(value)) => vec![(name.to_string(), value.to_string())],
                _ => Vec::new(),
            };
            let form = form.clone();
            return self.submit(&form, &extra).await;
        }

        Err(SessionError::NotInteractive { element: element.describe() })
    }

    async fn type_text(&mut self, element: &Element, text: &str) -> Result<(), SessionError> {
        self.ensure_open()?;

        let Some(name) = element.field_name().map(String::from) else {
            return Err(SessionError::NotInteractive { element: element.describe() });
        };

        let submit = text.ends_with(ENTER);
        let text = text.trim_end_matches(ENTER);

        match self.typed.iter_mut().find(|(n, _)| *n == name) {
            Some(field) => field.1.push_str(text),
            None => self.typed.push((name, text.to_string())),
        }

        if !submit {
            return Ok(());
        }

        match &element.form {
            Some(form) => {
                let form = form.clone();
                self.submit(&form, &[]).await
            }
            None => Err(SessionError::NotInteractive { element: element.describe() }),
        }
    }

    async fn execute_script(
        &mut self,
        _script: &str,
        _args: &[Element],
    ) -> Result<serde_json::Value, SessionError> {
        self.ensure_open()?;
        Err(SessionError::Unsupported("execute_script"))
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if !self.closed {
            debug!("Closing HTTP session");
        }
        self.closed = true;
        self.page = None;
        self.typed.clear();
        Ok(())
    }
}
