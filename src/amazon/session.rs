//! Navigation session interface.
//!
//! The pipeline only talks to pages through [`Session`], so the same crawl runs on a
//! plain HTTP session, a browser-backed one or a scripted test double.

use crate::error::SessionError;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

/// Typed into an input, submits the enclosing form (the Enter key).
pub const ENTER: char = '\n';

/// A page session that can navigate and interact with located elements.
#[async_trait]
pub trait Session: Send {
    /// Navigates to `url`, resolved against the current page when relative.
    async fn open(&mut self, url: &str) -> Result<(), SessionError>;

    /// HTML source of the current page.
    fn snapshot(&self) -> String;

    /// URL of the current page, if any page is loaded.
    fn current_url(&self) -> Option<String>;

    /// All elements on the current page matching `selector`, in document order.
    fn locate(&self, selector: &Selector) -> Vec<Element>;

    /// Activates an element (follows a link or submits its form).
    async fn click(&mut self, element: &Element) -> Result<(), SessionError>;

    /// Types into an input. Text ending in [`ENTER`] submits the input's form.
    async fn type_text(&mut self, element: &Element, text: &str) -> Result<(), SessionError>;

    /// Runs a script in the page.
    async fn execute_script(
        &mut self,
        script: &str,
        args: &[Element],
    ) -> Result<serde_json::Value, SessionError>;

    /// Releases the session. Further calls fail with [`SessionError::Closed`].
    async fn close(&mut self) -> Result<(), SessionError>;

    /// Returns the first element matching `selector`.
    fn locate_first(&self, selector: &Selector) -> Option<Element> {
        self.locate(selector).into_iter().next()
    }
}

/// The form an element belongs to, captured when the element is located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormTarget {
    /// Form action (may be relative; empty means the current page)
    pub action: String,
    /// Named fields with their current values, in document order
    pub fields: Vec<(String, String)>,
}

impl FormTarget {
    /// Builds the GET URL for submitting this form with `overrides` applied.
    pub fn submission_url(&self, overrides: &[(String, String)]) -> String {
        let mut fields = self.fields.clone();
        for (name, value) in overrides {
            match fields.iter_mut().find(|(n, _)| n == name) {
                Some(field) => field.1 = value.clone(),
                None => fields.push((name.clone(), value.clone())),
            }
        }

        let query = fields
            .iter()
            .map(|(n, v)| format!("{}={}", urlencoding::encode(n), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        if query.is_empty() {
            self.action.clone()
        } else if self.action.contains('?') {
            format!("{}&{}", self.action, query)
        } else {
            format!("{}?{}", self.action, query)
        }
    }
}

/// Owned snapshot of a located element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name
    pub tag: String,
    /// Whitespace-collapsed text content
    pub text: String,
    /// Attributes in source order
    pub attrs: Vec<(String, String)>,
    /// Enclosing form, if any
    pub form: Option<FormTarget>,
}

impl Element {
    /// Captures an element from a parsed document.
    pub fn from_ref(element: ElementRef<'_>) -> Self {
        let value = element.value();
        let attrs = value.attrs().map(|(k, v)| (k.to_string(), v.to_string())).collect();

        let form = element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|a| a.value().name() == "form")
            .map(capture_form);

        Self {
            tag: value.name().to_string(),
            text: collapse_whitespace(&element.text().collect::<String>()),
            attrs,
            form,
        }
    }

    /// Returns an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// Link target, when the element is an anchor with a non-script href.
    pub fn href(&self) -> Option<&str> {
        self.attr("href").filter(|h| !h.is_empty() && !h.starts_with("javascript:"))
    }

    /// Field name used when typing into this element.
    pub fn field_name(&self) -> Option<&str> {
        self.attr("name").or_else(|| self.attr("id"))
    }

    /// Short description for logs and errors.
    pub fn describe(&self) -> String {
        match (self.attr("id"), self.attr("value")) {
            (Some(id), _) => format!("{}#{}", self.tag, id),
            (None, Some(value)) => format!("{} value=\"{}\"", self.tag, value),
            (None, None) => self.tag.clone(),
        }
    }
}

fn capture_form(form: ElementRef<'_>) -> FormTarget {
    static FIELDS: std::sync::LazyLock<Selector> =
        std::sync::LazyLock::new(|| Selector::parse("input[name], select[name]").unwrap());

    let fields = form
        .select(&FIELDS)
        .filter(|f| !matches!(f.value().attr("type"), Some("submit") | Some("button")))
        .filter_map(|f| {
            let name = f.value().attr("name")?;
            Some((name.to_string(), f.value().attr("value").unwrap_or_default().to_string()))
        })
        .collect();

    FormTarget { action: form.value().attr("action").unwrap_or_default().to_string(), fields }
}

/// Locates elements in an HTML source. Shared by session implementations.
pub fn locate_in(html: &str, selector: &Selector) -> Vec<Element> {
    let document = Html::parse_document(html);
    document.select(selector).map(Element::from_ref).collect()
}

/// Collapses runs of whitespace into single spaces and trims.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sel(css: &str) -> Selector {
        Selector::parse(css).unwrap()
    }

    #[test]
    fn test_element_capture() {
        let html = r#"<a id="acrCustomerReviewLink" href="/product-reviews/B0TEST0001">
                         <span>  1,234
                         ratings </span></a>"#;
        let elements = locate_in(html, &sel("#acrCustomerReviewLink"));
        assert_eq!(elements.len(), 1);

        let link = &elements[0];
        assert_eq!(link.tag, "a");
        assert_eq!(link.text, "1,234 ratings");
        assert_eq!(link.href(), Some("/product-reviews/B0TEST0001"));
        assert_eq!(link.describe(), "a#acrCustomerReviewLink");
        assert!(link.form.is_none());
    }

    #[test]
    fn test_javascript_href_is_not_a_link() {
        let elements = locate_in(r#"<a href="javascript:void(0)">x</a>"#, &sel("a"));
        assert_eq!(elements[0].href(), None);
    }

    #[test]
    fn test_form_capture_and_submission() {
        let html = r#"<form action="/s" method="get">
                <input type="hidden" name="i" value="aps">
                <input type="text" id="twotabsearchtextbox" name="field-keywords" value="">
                <input type="submit" value="Go">
            </form>"#;
        let input = locate_in(html, &sel("#twotabsearchtextbox")).remove(0);
        let form = input.form.clone().unwrap();
        assert_eq!(form.action, "/s");
        assert_eq!(form.fields.len(), 2);
        assert_eq!(input.field_name(), Some("field-keywords"));

        let url = form.submission_url(&[("field-keywords".to_string(), "usb hub".to_string())]);
        assert_eq!(url, "/s?i=aps&field-keywords=usb%20hub");
    }

    #[test]
    fn test_form_submission_without_fields() {
        let form = FormTarget { action: "/gp/delivery".to_string(), fields: Vec::new() };
        assert_eq!(form.submission_url(&[]), "/gp/delivery");

        let form = FormTarget { action: "/x?a=1".to_string(), fields: Vec::new() };
        assert_eq!(form.submission_url(&[("b".to_string(), "2".to_string())]), "/x?a=1&b=2");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(collapse_whitespace(""), "");
    }
}
