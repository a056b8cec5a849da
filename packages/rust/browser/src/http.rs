//! Plain-HTTP backend. No script execution: "rendering" is the server's HTML,
//! and readiness is re-polled by fetching again after a settle delay.

use std::time::Duration;

use oddsboard_shared::{OddsError, Result};
use reqwest::Client;
use tracing::{debug, instrument};

use crate::{Browser, MOBILE_USER_AGENT, OpenOptions, RenderedPage, contains_selector};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Maximum response size we accept (10 MB).
const MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

/// Backend that loads pages with a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpBrowser {
    client: Client,
}

impl HttpBrowser {
    /// Build the shared client. Fails only if TLS initialisation fails, which
    /// the caller treats as a fatal setup error.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(MOBILE_USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| OddsError::Browser(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn get_text(&self, url: &str, timeout: Duration) -> Result<(String, String)> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_request_error(url, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OddsError::Network(format!("{url}: HTTP {status}")));
        }

        if let Some(len) = response.content_length() {
            if len > MAX_RESPONSE_SIZE {
                return Err(OddsError::validation(format!(
                    "{url}: response too large ({len} bytes, max {MAX_RESPONSE_SIZE})"
                )));
            }
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| map_request_error(url, timeout, e))?;

        Ok((final_url, body))
    }

    async fn open_inner(&self, url: &str, opts: &OpenOptions) -> Result<RenderedPage> {
        let mut attempt = 0;
        loop {
            let (final_url, html) = self.get_text(url, opts.timeout).await?;

            let Some(marker) = opts.wait_for.as_deref() else {
                return Ok(RenderedPage::from_html(final_url, html));
            };

            if contains_selector(&html, marker)? {
                debug!(url, marker, attempt, "readiness marker present");
                return Ok(RenderedPage::from_html(final_url, html));
            }

            if attempt >= opts.ready_retries {
                if opts.allow_unready {
                    debug!(url, marker, "readiness marker never appeared, continuing");
                    return Ok(RenderedPage::from_html(final_url, html));
                }
                return Err(OddsError::parse(format!(
                    "{url}: readiness marker '{marker}' not found after {} attempts",
                    attempt + 1
                )));
            }

            attempt += 1;
            debug!(url, marker, attempt, "readiness marker missing, settling");
            tokio::time::sleep(opts.settle).await;
        }
    }
}

impl Browser for HttpBrowser {
    #[instrument(skip_all, fields(url = %url))]
    async fn open(&self, url: &str, opts: &OpenOptions) -> Result<RenderedPage> {
        // The overall budget covers every retry, not just one request.
        match tokio::time::timeout(opts.timeout, self.open_inner(url, opts)).await {
            Ok(result) => result,
            Err(_) => Err(OddsError::timeout(url, opts.timeout.as_secs())),
        }
    }

    async fn fetch_raw(&self, url: &str, timeout: Duration) -> Result<String> {
        let (_, body) = self.get_text(url, timeout).await?;
        Ok(body)
    }

    fn name(&self) -> &str {
        "http"
    }
}

fn map_request_error(url: &str, timeout: Duration, e: reqwest::Error) -> OddsError {
    if e.is_timeout() {
        OddsError::timeout(url, timeout.as_secs())
    } else {
        OddsError::Network(format!("{url}: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_opts() -> OpenOptions {
        OpenOptions {
            wait_for: None,
            ready_retries: 2,
            settle: Duration::from_millis(10),
            timeout: Duration::from_secs(5),
            allow_unready: false,
        }
    }

    #[tokio::test]
    async fn open_returns_title_and_html() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/jczq"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(
                "<html><head><title>竞彩足球</title></head><body><table id=\"table_match\"></table></body></html>",
            ))
            .mount(&server)
            .await;

        let browser = HttpBrowser::new().unwrap();
        let url = format!("{}/jczq", server.uri());
        let page = browser
            .open(&url, &fast_opts().with_wait_for("#table_match"))
            .await
            .unwrap();

        assert_eq!(page.title, "竞彩足球");
        assert!(page.html.contains("table_match"));
    }

    #[tokio::test]
    async fn open_fails_when_marker_never_appears() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/empty"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_string("<html><body></body></html>"),
            )
            .expect(3)
            .mount(&server)
            .await;

        let browser = HttpBrowser::new().unwrap();
        let url = format!("{}/empty", server.uri());
        let err = browser
            .open(&url, &fast_opts().with_wait_for("#datatb"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("readiness marker"));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn open_can_proceed_without_marker() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/plain"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(
                "<html><head><title>周一001</title></head><body>周一001</body></html>",
            ))
            .mount(&server)
            .await;

        let browser = HttpBrowser::new().unwrap();
        let page = browser
            .open(
                &format!("{}/plain", server.uri()),
                &fast_opts().with_wait_for("table").allow_unready(),
            )
            .await
            .unwrap();
        assert_eq!(page.title, "周一001");
    }

    #[tokio::test]
    async fn open_reports_http_errors() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/gone"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let browser = HttpBrowser::new().unwrap();
        let err = browser
            .open(&format!("{}/gone", server.uri()), &fast_opts())
            .await
            .unwrap_err();
        assert!(matches!(err, OddsError::Network(_)));
    }

    #[tokio::test]
    async fn open_times_out() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/slow"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string("<html></html>")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let browser = HttpBrowser::new().unwrap();
        let opts = OpenOptions {
            timeout: Duration::from_millis(200),
            ..fast_opts()
        };
        let err = browser
            .open(&format!("{}/slow", server.uri()), &opts)
            .await
            .unwrap_err();
        assert!(matches!(err, OddsError::Timeout { .. }));
    }

    #[tokio::test]
    async fn fetch_raw_returns_body() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/fenxi1/ouzhi_json.php"))
            .and(wiremock::matchers::query_param("fid", "1234"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(r#"[["威廉希尔","0.91","0.95","0.97"]]"#))
            .mount(&server)
            .await;

        let browser = HttpBrowser::new().unwrap();
        let body = browser
            .fetch_raw(
                &format!("{}/fenxi1/ouzhi_json.php?fid=1234", server.uri()),
                Duration::from_secs(5),
            )
            .await
            .unwrap();
        assert!(body.contains("威廉希尔"));
    }
}
