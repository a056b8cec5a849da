//! Canned-page backend. Serves HTML and raw bodies from in-memory maps, which
//! makes every pipeline stage runnable without a network.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use oddsboard_shared::{OddsError, Result};

use crate::{Browser, OpenOptions, RenderedPage};

#[derive(Debug, Default)]
pub struct MemoryBrowser {
    pages: HashMap<String, String>,
    raw: HashMap<String, String>,
    visits: Mutex<Vec<String>>,
}

impl MemoryBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register HTML served by [`Browser::open`] for `url`.
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// Register a body served by [`Browser::fetch_raw`] for `url`.
    pub fn with_raw(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.raw.insert(url.into(), body.into());
        self
    }

    /// Every URL passed to `open` or `fetch_raw`, in call order.
    pub fn visits(&self) -> Vec<String> {
        self.visits
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    fn record_visit(&self, url: &str) {
        if let Ok(mut visits) = self.visits.lock() {
            visits.push(url.to_string());
        }
    }
}

impl Browser for MemoryBrowser {
    async fn open(&self, url: &str, opts: &OpenOptions) -> Result<RenderedPage> {
        self.record_visit(url);

        let html = self
            .pages
            .get(url)
            .ok_or_else(|| OddsError::Network(format!("{url}: HTTP 404 Not Found")))?;

        let page = RenderedPage::from_html(url, html.clone());
        if let Some(marker) = opts.wait_for.as_deref() {
            if !opts.allow_unready && !page.has_selector(marker)? {
                return Err(OddsError::parse(format!(
                    "{url}: readiness marker '{marker}' not found after {} attempts",
                    opts.ready_retries + 1
                )));
            }
        }

        Ok(page)
    }

    async fn fetch_raw(&self, url: &str, _timeout: Duration) -> Result<String> {
        self.record_visit(url);
        self.raw
            .get(url)
            .cloned()
            .ok_or_else(|| OddsError::Network(format!("{url}: HTTP 404 Not Found")))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_registered_pages_and_tracks_visits() {
        let browser = MemoryBrowser::new()
            .with_page("https://live.500.com/", "<title>直播</title><table id=\"t\"></table>")
            .with_raw("https://odds.500.com/fenxi1/ouzhi_json.php?fid=1", "[]");

        let page = browser
            .open("https://live.500.com/", &OpenOptions::default().with_wait_for("#t"))
            .await
            .unwrap();
        assert_eq!(page.title, "直播");

        let raw = browser
            .fetch_raw(
                "https://odds.500.com/fenxi1/ouzhi_json.php?fid=1",
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert_eq!(raw, "[]");

        assert_eq!(browser.visits().len(), 2);
    }

    #[tokio::test]
    async fn unknown_url_is_network_error() {
        let browser = MemoryBrowser::new();
        let err = browser
            .open("https://nowhere.test/", &OpenOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OddsError::Network(_)));
    }

    #[tokio::test]
    async fn missing_marker_is_parse_error() {
        let browser = MemoryBrowser::new().with_page("https://a.test/", "<p>loading</p>");
        let err = browser
            .open("https://a.test/", &OpenOptions::default().with_wait_for("#datatb"))
            .await
            .unwrap_err();
        assert!(matches!(err, OddsError::Parse { .. }));
    }
}
