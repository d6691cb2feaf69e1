//! Scripted in-memory storefront used by the pipeline tests.

#![allow(dead_code)]

use amz_reviews::amazon::session::{locate_in, Element, ENTER};
use amz_reviews::amazon::Session;
use amz_reviews::SessionError;
use async_trait::async_trait;
use scraper::Selector;
use std::collections::HashMap;

pub const HOME: &str = include_str!("../fixtures/home.html");
pub const SEARCH_RESULTS: &str = include_str!("../fixtures/search_results.html");
pub const PRODUCT: &str = include_str!("../fixtures/product.html");
pub const REVIEWS_PAGE_1: &str = include_str!("../fixtures/reviews_page1.html");
pub const REVIEWS_PAGE_2: &str = include_str!("../fixtures/reviews_page2.html");
pub const REVIEWS_PAGE_3: &str = include_str!("../fixtures/reviews_page3.html");
pub const REVIEWS_ALTERNATE: &str = include_str!("../fixtures/reviews_alternate.html");

pub const SEARCH_PATH: &str = "/s/ref=nb_sb_noss";
pub const PRODUCT_PATH: &str = "/boAt-Airdopes-141-Playtime-Resistance/dp/B09N3ZNHTY/ref=sr_1_2";
pub const REVIEWS_PATH: &str =
    "/boAt-Airdopes-141-Playtime-Resistance/product-reviews/B09N3ZNHTY/ref=cm_cr_dp_d_show_all_btm";
pub const REVIEWS_PATH_2: &str =
    "/boAt-Airdopes-141-Playtime-Resistance/product-reviews/B09N3ZNHTY/ref=cm_cr_arp_d_paging_btm_next_2";
pub const REVIEWS_PATH_3: &str =
    "/boAt-Airdopes-141-Playtime-Resistance/product-reviews/B09N3ZNHTY/ref=cm_cr_arp_d_paging_btm_next_3";

/// Serves pages by path. Links are followed, forms submitted with the typed text,
/// and controls without a target are treated as in-page buttons.
pub struct ScriptedSession {
    pages: HashMap<String, String>,
    current: Option<String>,
    typed: String,
    pub opened: Vec<String>,
    pub clicked: Vec<String>,
    pub closed: bool,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            current: None,
            typed: String::new(),
            opened: Vec::new(),
            clicked: Vec::new(),
            closed: false,
        }
    }

    /// The full storefront: home, search, product and three review pages.
    pub fn storefront() -> Self {
        Self::new()
            .page("/", HOME)
            .page(SEARCH_PATH, SEARCH_RESULTS)
            .page(PRODUCT_PATH, PRODUCT)
            .page(REVIEWS_PATH, REVIEWS_PAGE_1)
            .page(REVIEWS_PATH_2, REVIEWS_PAGE_2)
            .page(REVIEWS_PATH_3, REVIEWS_PAGE_3)
    }

    pub fn page(mut self, path: &str, html: &str) -> Self {
        self.pages.insert(path.to_string(), html.to_string());
        self
    }

    pub fn without(mut self, path: &str) -> Self {
        self.pages.remove(path);
        self
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }
}

impl Default for ScriptedSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Path of a URL, dropping scheme, host, query and fragment.
fn path_of(url: &str) -> &str {
    let rest = match url.find("://") {
        Some(i) => {
            let after = &url[i + 3..];
            after.find('/').map(|j| &after[j..]).unwrap_or("/")
        }
        None => url,
    };
    rest.split(['?', '#']).next().unwrap_or(rest)
}

#[async_trait]
impl Session for ScriptedSession {
    async fn open(&mut self, url: &str) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        self.opened.push(url.to_string());

        let path = path_of(url);
        if self.pages.contains_key(path) {
            self.current = Some(path.to_string());
            Ok(())
        } else {
            Err(SessionError::PageUnreachable {
                url: url.to_string(),
                reason: "status 404".to_string(),
            })
        }
    }

    fn snapshot(&self) -> String {
        self.current.as_ref().and_then(|p| self.pages.get(p)).cloned().unwrap_or_default()
    }

    fn current_url(&self) -> Option<String> {
        self.current.as_ref().map(|p| format!("https://www.amazon.in{}", p))
    }

    fn locate(&self, selector: &Selector) -> Vec<Element> {
        locate_in(&self.snapshot(), selector)
    }

    async fn click(&mut self, element: &Element) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        self.clicked.push(element.describe());
        match element.href() {
            Some(href) => {
                let href = href.to_string();
                self.open(&href).await
            }
            None => Ok(()),
        }
    }

    async fn type_text(&mut self, element: &Element, text: &str) -> Result<(), SessionError> {
        self.typed.push_str(text.trim_end_matches(ENTER));
        if !text.ends_with(ENTER) {
            return Ok(());
        }

        let form = element
            .form
            .clone()
            .ok_or_else(|| SessionError::NotInteractive { element: element.describe() })?;
        let name = element.field_name().unwrap_or_default().to_string();
        let target = form.submission_url(&[(name, self.typed.clone())]);
        self.open(&target).await
    }

    async fn execute_script(
        &mut self,
        _script: &str,
        _args: &[Element],
    ) -> Result<serde_json::Value, SessionError> {
        Ok(serde_json::Value::Null)
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.closed = true;
        Ok(())
    }
}
