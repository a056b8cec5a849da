//! Browser-automation capability used by the scraping pipeline.
//!
//! The pipeline only needs a narrow surface: open a URL, wait for a readiness
//! marker, hand back the rendered DOM (with its title) and close the page, plus
//! a direct fetch for raw structured data. Extraction routines are pure
//! functions over the parsed [`scraper::Html`] of a [`RenderedPage`].
//!
//! Backends:
//! - [`HttpBrowser`] — plain HTTP via `reqwest`, the default
//! - [`ChromeBrowser`] — headless Chromium (feature `chrome`)
//! - [`MemoryBrowser`] — canned pages for offline runs and tests

#[cfg(feature = "chrome")]
mod chrome;
mod http;
mod memory;

use std::future::Future;
use std::time::Duration;

use oddsboard_shared::{OddsError, Result};
use scraper::{Html, Selector};

#[cfg(feature = "chrome")]
pub use chrome::ChromeBrowser;
pub use http::HttpBrowser;
pub use memory::MemoryBrowser;

/// Mobile Safari user agent; the listing site serves its simpler markup to it.
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Mobile/15E148 Safari/604.1";

// ---------------------------------------------------------------------------
// Page options / result
// ---------------------------------------------------------------------------

/// How to open a page.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// CSS selector that must be present before the page counts as rendered.
    pub wait_for: Option<String>,
    /// Readiness re-checks after the first look.
    pub ready_retries: u32,
    /// Pause between readiness checks (and after navigation).
    pub settle: Duration,
    /// Budget for the whole visit, including retries.
    pub timeout: Duration,
    /// Hand back whatever rendered when the marker never shows up, instead of
    /// failing the visit.
    pub allow_unready: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            wait_for: None,
            ready_retries: 3,
            settle: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
            allow_unready: false,
        }
    }
}

impl OpenOptions {
    pub fn with_wait_for(mut self, selector: impl Into<String>) -> Self {
        self.wait_for = Some(selector.into());
        self
    }

    pub fn allow_unready(mut self) -> Self {
        self.allow_unready = true;
        self
    }
}

/// A page captured after rendering. The underlying tab is already closed.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Final URL after redirects.
    pub url: String,
    /// Contents of `<title>`, trimmed.
    pub title: String,
    /// Full document HTML.
    pub html: String,
}

impl RenderedPage {
    /// Build a page from raw HTML, reading the title out of the document.
    pub fn from_html(url: impl Into<String>, html: impl Into<String>) -> Self {
        let html = html.into();
        let title = title_of(&Html::parse_document(&html));
        Self {
            url: url.into(),
            title,
            html,
        }
    }

    /// Parse the captured HTML. `Html` is not `Send`; parse where you use it.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.html)
    }

    /// Whether `selector` matches anything in the captured HTML.
    pub fn has_selector(&self, selector: &str) -> Result<bool> {
        contains_selector(&self.html, selector)
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// The automation capability the pipeline depends on.
///
/// One instance is shared (behind an `Arc`) by every concurrent page visit.
pub trait Browser: Send + Sync + 'static {
    /// Navigate to `url`, wait for readiness, capture and close the page.
    fn open(
        &self,
        url: &str,
        opts: &OpenOptions,
    ) -> impl Future<Output = Result<RenderedPage>> + Send;

    /// Fetch a URL directly (no rendering), e.g. a JSON data endpoint.
    fn fetch_raw(&self, url: &str, timeout: Duration)
    -> impl Future<Output = Result<String>> + Send;

    /// Human-readable backend name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Helpers shared by backends
// ---------------------------------------------------------------------------

/// Parse a CSS selector, mapping the error into [`OddsError`].
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| OddsError::parse(format!("invalid selector '{selector}': {e}")))
}

/// Whether `selector` matches anything in `html`.
pub fn contains_selector(html: &str, selector: &str) -> Result<bool> {
    let sel = parse_selector(selector)?;
    let doc = Html::parse_document(html);
    let found = doc.select(&sel).next().is_some();
    Ok(found)
}

/// Trimmed `<title>` text, empty when absent.
pub fn title_of(doc: &Html) -> String {
    let Ok(sel) = Selector::parse("title") else {
        return String::new();
    };
    doc.select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_page_reads_title() {
        let page = RenderedPage::from_html(
            "https://live.500.com/",
            "<html><head><title> 竞彩足球比分直播 </title></head><body></body></html>",
        );
        assert_eq!(page.title, "竞彩足球比分直播");
    }

    #[test]
    fn has_selector_checks_markup() {
        let page = RenderedPage::from_html(
            "https://odds.500.com/fenxi/ouzhi-1.shtml",
            r#"<html><body><table id="datatb"><tr><td>1</td></tr></table></body></html>"#,
        );
        assert!(page.has_selector("#datatb").unwrap());
        assert!(!page.has_selector("#missing").unwrap());
    }

    #[test]
    fn invalid_selector_is_parse_error() {
        let err = contains_selector("<p></p>", "tr[").unwrap_err();
        assert!(matches!(err, OddsError::Parse { .. }));
    }

    #[test]
    fn missing_title_is_empty() {
        let page = RenderedPage::from_html("https://x.test/", "<p>no head</p>");
        assert!(page.title.is_empty());
    }
}
