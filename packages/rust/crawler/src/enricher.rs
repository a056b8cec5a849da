//! Bounded-concurrency fan-out over detail pages.
//!
//! Each task owns one record index and returns what it found; results are
//! merged after the join barrier, so no two tasks ever touch the same record
//! and completion order cannot affect the merged state.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use oddsboard_browser::{Browser, OpenOptions};
use oddsboard_shared::{EnrichOptions, Enrichment, OddsError, Record, Result};

use crate::detail::DetailPass;

/// Tally of one enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStats {
    /// Records whose detail page was visited.
    pub visited: usize,
    /// Records that received values.
    pub enriched: usize,
    /// Visits that errored (navigation, timeout, bad payload).
    pub failed: usize,
    /// Records with no detail URL.
    pub skipped: usize,
}

impl EnrichStats {
    pub fn merge(&mut self, other: EnrichStats) {
        self.visited += other.visited;
        self.enriched += other.enriched;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

type TaskResult = (usize, String, Result<Option<Enrichment>>);

/// Run `pass` over every record, at most `opts.concurrency` visits at a time.
///
/// Per-record failures are logged and counted; the record keeps whatever it
/// held before. The record count and identities never change.
#[instrument(skip_all, fields(pass = pass.name(), records = records.len()))]
pub async fn enrich<B, P>(
    browser: Arc<B>,
    records: &mut [Record],
    pass: Arc<P>,
    opts: &EnrichOptions,
    progress: &mut (dyn FnMut(&str) + Send),
) -> EnrichStats
where
    B: Browser,
    P: DetailPass,
{
    let mut stats = EnrichStats::default();
    let semaphore = Arc::new(Semaphore::new(opts.concurrency.max(1)));
    let mut tasks: JoinSet<TaskResult> = JoinSet::new();

    for (idx, record) in records.iter().enumerate() {
        let Some(url) = pass.detail_url(record) else {
            debug!(match_id = %record.match_id, "no detail URL, skipping");
            stats.skipped += 1;
            continue;
        };

        let browser = browser.clone();
        let pass = pass.clone();
        let sem = semaphore.clone();
        let opts = opts.clone();
        let url = url.to_string();
        let match_id = record.match_id.clone();

        tasks.spawn(async move {
            let Ok(_permit) = sem.acquire_owned().await else {
                return (idx, match_id, Err(OddsError::validation("enrich semaphore closed")));
            };
            let found = visit(browser.as_ref(), pass.as_ref(), &url, &opts).await;
            (idx, match_id, found)
        });
    }

    let total = tasks.len();
    info!(total, skipped = stats.skipped, "visiting detail pages");

    let mut found: Vec<(usize, String, Enrichment)> = Vec::new();
    let mut done = 0;

    while let Some(joined) = tasks.join_next().await {
        done += 1;
        let (idx, match_id, result) = match joined {
            Ok(task) => task,
            Err(e) => {
                warn!(error = %e, "detail task panicked or was aborted");
                stats.failed += 1;
                continue;
            }
        };
        stats.visited += 1;

        match result {
            Ok(Some(enrichment)) => {
                debug!(%match_id, "detail values found");
                found.push((idx, match_id.clone(), enrichment));
            }
            Ok(None) => debug!(%match_id, "no clean values for bookmaker"),
            Err(e) => {
                warn!(%match_id, error = %e, "detail visit failed");
                stats.failed += 1;
            }
        }

        progress(&format!("{} {done}/{total} {match_id}", pass.name()));
    }

    for (idx, match_id, enrichment) in found {
        match records.get_mut(idx) {
            Some(record) if record.match_id == match_id => {
                record.apply(&enrichment);
                stats.enriched += 1;
            }
            _ => warn!(%match_id, idx, "record moved during enrichment, result dropped"),
        }
    }

    info!(
        visited = stats.visited,
        enriched = stats.enriched,
        failed = stats.failed,
        "pass complete"
    );
    stats
}

/// Visit one detail page; fall back to the raw payload when the page shows no
/// clean values.
async fn visit<B: Browser, P: DetailPass>(
    browser: &B,
    pass: &P,
    url: &str,
    opts: &EnrichOptions,
) -> Result<Option<Enrichment>> {
    let marker = pass.marker(opts);
    let open = OpenOptions {
        wait_for: Some(pass.ready_selector().to_string()),
        ready_retries: opts.ready_retries,
        settle: opts.settle,
        timeout: opts.page_timeout,
        allow_unready: false,
    };

    let page = browser.open(url, &open).await?;
    let found = {
        let doc = page.document();
        pass.extract(&doc, marker)
    };
    if found.is_some() {
        return Ok(found);
    }

    let Some(raw_url) = pass.raw_url(url) else {
        return Ok(None);
    };
    debug!(url, raw_url, "no values on page, trying raw data");

    let body = browser.fetch_raw(&raw_url, opts.page_timeout).await?;
    let payload: Value = serde_json::from_str(&body)
        .map_err(|e| OddsError::parse(format!("{raw_url}: invalid JSON: {e}")))?;
    Ok(pass.extract_raw(&payload, marker))
}
