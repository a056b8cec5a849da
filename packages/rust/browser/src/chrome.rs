//! Headless Chromium backend. `headless_chrome` is a blocking API, so each visit
//! runs on the blocking pool and owns its tab from open to close.

use std::time::{Duration, Instant};

use oddsboard_shared::{OddsError, Result};
use tracing::{debug, instrument, warn};

use crate::{Browser, HttpBrowser, MOBILE_USER_AGENT, OpenOptions, RenderedPage};

pub struct ChromeBrowser {
    inner: headless_chrome::Browser,
    raw: HttpBrowser,
}

impl ChromeBrowser {
    /// Launch the engine. Any failure here is fatal for the run.
    pub fn launch(headless: bool) -> Result<Self> {
        let options = headless_chrome::LaunchOptionsBuilder::default()
            .headless(headless)
            .window_size(Some((390, 844)))
            .build()
            .map_err(|e| OddsError::Browser(format!("invalid launch options: {e}")))?;

        let inner = headless_chrome::Browser::new(options)
            .map_err(|e| OddsError::Browser(format!("failed to launch chromium: {e}")))?;

        Ok(Self {
            inner,
            raw: HttpBrowser::new()?,
        })
    }
}

impl Browser for ChromeBrowser {
    #[instrument(skip_all, fields(url = %url))]
    async fn open(&self, url: &str, opts: &OpenOptions) -> Result<RenderedPage> {
        let browser = self.inner.clone();
        let target = url.to_string();
        let opts = opts.clone();

        tokio::task::spawn_blocking(move || visit(&browser, &target, &opts))
            .await
            .map_err(|e| OddsError::Browser(format!("page task failed: {e}")))?
    }

    async fn fetch_raw(&self, url: &str, timeout: Duration) -> Result<String> {
        self.raw.fetch_raw(url, timeout).await
    }

    fn name(&self) -> &str {
        "chrome"
    }
}

fn visit(browser: &headless_chrome::Browser, url: &str, opts: &OpenOptions) -> Result<RenderedPage> {
    let started = Instant::now();

    let tab = browser.new_tab().map_err(|e| net_err(url, e))?;
    tab.set_default_timeout(opts.timeout);
    if let Err(e) = tab.set_user_agent(MOBILE_USER_AGENT, None, None) {
        warn!(url, error = %e, "could not set user agent");
    }

    let result = (|| -> Result<RenderedPage> {
        tab.navigate_to(url).map_err(|e| net_err(url, e))?;
        tab.wait_until_navigated().map_err(|e| net_err(url, e))?;

        if let Some(marker) = opts.wait_for.as_deref() {
            let mut attempt = 0;
            while tab.find_element(marker).is_err() {
                if started.elapsed() >= opts.timeout {
                    return Err(OddsError::timeout(url, opts.timeout.as_secs()));
                }
                if attempt >= opts.ready_retries {
                    if opts.allow_unready {
                        debug!(url, marker, "readiness marker never appeared, continuing");
                        break;
                    }
                    return Err(OddsError::parse(format!(
                        "{url}: readiness marker '{marker}' not found after {} attempts",
                        attempt + 1
                    )));
                }
                attempt += 1;
                debug!(url, marker, attempt, "readiness marker missing, settling");
                std::thread::sleep(opts.settle);
            }
        }

        std::thread::sleep(opts.settle);

        let html = tab.get_content().map_err(|e| net_err(url, e))?;
        let title = tab.get_title().unwrap_or_default();
        Ok(RenderedPage {
            url: tab.get_url(),
            title: title.trim().to_string(),
            html,
        })
    })();

    // The page never outlives the visit, success or not.
    if let Err(e) = tab.close(true) {
        debug!(url, error = %e, "tab close failed");
    }

    result
}

fn net_err(url: &str, e: impl std::fmt::Display) -> OddsError {
    OddsError::Network(format!("{url}: {e}"))
}
