//! End-to-end scrape: listing page → filter/limit → detail passes → sinks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use oddsboard_browser::Browser;
use oddsboard_crawler::{AsianHandicapPass, DetailPass, EnrichStats, KellyPass, enrich, extract_base};
use oddsboard_shared::{Record, Result, RunId, ScrapeConfig};

use crate::cancel::CancelFlag;
use crate::events::{ChannelSink, EventSink, PipelineEvent};
use crate::filter::{same_day_filter, truncate};

/// How a run ended.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Live data, possibly enriched.
    Completed {
        records: Vec<Record>,
        stats: EnrichStats,
    },
    /// Extraction failed entirely; `records` are the synthetic batch.
    Degraded { records: Vec<Record>, reason: String },
    /// Stopped by the caller. Holds only what had been emitted.
    Cancelled { records: Vec<Record> },
}

impl Outcome {
    pub fn records(&self) -> &[Record] {
        match self {
            Self::Completed { records, .. }
            | Self::Degraded { records, .. }
            | Self::Cancelled { records } => records,
        }
    }

    pub fn into_records(self) -> Vec<Record> {
        match self {
            Self::Completed { records, .. }
            | Self::Degraded { records, .. }
            | Self::Cancelled { records } => records,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Facts about a run that are not records.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: RunId,
    pub source_url: String,
    pub page_title: String,
    /// Row strategy that matched, absent for fallback batches.
    pub strategy: Option<String>,
    pub elapsed: Duration,
    pub asian_handicap: bool,
    pub kelly: bool,
}

/// Result of [`run_pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub summary: RunSummary,
    pub outcome: Outcome,
}

/// Run the whole pipeline.
///
/// 1. Extract the listing page (fallback batch on failure → degraded)
/// 2. Same-day filter and truncation
/// 3. Emit every record
/// 4. Asian handicap pass, re-emit; Kelly pass, re-emit
/// 5. Terminal event
///
/// Only fatal errors (invalid config, unusable browser) are returned as `Err`.
#[instrument(skip_all, fields(url = %config.url, backend = browser.name()))]
pub async fn run_pipeline<B: Browser>(
    browser: Arc<B>,
    config: &ScrapeConfig,
    sink: &dyn EventSink,
    cancel: &CancelFlag,
) -> Result<PipelineRun> {
    config.validate()?;

    let started = Instant::now();
    let run_id = RunId::new();
    info!(%run_id, "starting scrape");

    // --- Phase 1: Listing page ---
    sink.progress("Loading listing page");
    let extraction = extract_base(browser.as_ref(), config).await?;

    let mut summary = RunSummary {
        run_id,
        source_url: config.url.clone(),
        page_title: extraction.page_title.clone(),
        strategy: extraction.strategy.clone(),
        elapsed: Duration::ZERO,
        asian_handicap: config.asian_handicap,
        kelly: config.kelly,
    };

    if cancel.is_cancelled() {
        return Ok(cancelled(summary, started, Vec::new()));
    }

    if let Some(reason) = extraction.failure {
        warn!(%reason, count = extraction.records.len(), "degraded run");
        sink.progress(&format!("Live extraction failed: {reason}"));

        let emitted = emit(&extraction.records, sink, cancel);
        if emitted < extraction.records.len() {
            let records = extraction.records[..emitted].to_vec();
            return Ok(cancelled(summary, started, records));
        }
        if cancel.is_cancelled() {
            return Ok(cancelled(summary, started, extraction.records));
        }

        summary.elapsed = started.elapsed();
        let run = PipelineRun {
            summary,
            outcome: Outcome::Degraded {
                records: extraction.records,
                reason,
            },
        };
        sink.finished(&run);
        return Ok(run);
    }

    // --- Phase 2: Filter / limit ---
    let mut records = extraction.records;
    if config.same_day_only {
        records = same_day_filter(records);
    }
    records = truncate(records, config.max_records);
    sink.progress(&format!("Found {} fixtures", records.len()));

    // --- Phase 3: First emission ---
    let emitted = emit(&records, sink, cancel);
    if emitted < records.len() {
        records.truncate(emitted);
        return Ok(cancelled(summary, started, records));
    }

    // --- Phase 4: Detail passes ---
    let mut stats = EnrichStats::default();

    if config.asian_handicap {
        if let Some(run) = run_pass(
            &browser,
            &mut records,
            AsianHandicapPass,
            config,
            sink,
            cancel,
            &mut stats,
        )
        .await
        {
            return Ok(cancelled(summary, started, run));
        }
    }

    if config.kelly {
        if let Some(run) = run_pass(
            &browser,
            &mut records,
            KellyPass,
            config,
            sink,
            cancel,
            &mut stats,
        )
        .await
        {
            return Ok(cancelled(summary, started, run));
        }
    }

    // --- Phase 5: Done ---
    // The flag may have been cleared by the last emission.
    if cancel.is_cancelled() {
        return Ok(cancelled(summary, started, records));
    }

    summary.elapsed = started.elapsed();
    info!(
        count = records.len(),
        enriched = stats.enriched,
        failed = stats.failed,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "scrape complete"
    );
    sink.progress("Done");

    let run = PipelineRun {
        summary,
        outcome: Outcome::Completed { records, stats },
    };
    sink.finished(&run);
    Ok(run)
}

/// Run one detail pass and re-emit. Returns the partial record list if the
/// run was cancelled before or during re-emission.
async fn run_pass<B: Browser, P: DetailPass>(
    browser: &Arc<B>,
    records: &mut Vec<Record>,
    pass: P,
    config: &ScrapeConfig,
    sink: &dyn EventSink,
    cancel: &CancelFlag,
    stats: &mut EnrichStats,
) -> Option<Vec<Record>> {
    if cancel.is_cancelled() {
        return Some(std::mem::take(records));
    }

    let name = pass.name();
    sink.progress(&format!("Fetching {name} details"));

    let published = records.clone();
    let pass_stats = enrich(
        browser.clone(),
        records,
        Arc::new(pass),
        &config.enrich,
        &mut |message: &str| sink.progress(message),
    )
    .await;
    stats.merge(pass_stats);

    // In-flight results landed, but a cancelled run does not publish them.
    if cancel.is_cancelled() {
        return Some(published);
    }

    let emitted = emit(records, sink, cancel);
    if emitted < records.len() {
        records.truncate(emitted);
        return Some(std::mem::take(records));
    }
    None
}

/// Emit records in order until the flag is cleared. Returns how many went out.
fn emit(records: &[Record], sink: &dyn EventSink, cancel: &CancelFlag) -> usize {
    for (i, record) in records.iter().enumerate() {
        if cancel.is_cancelled() {
            info!(emitted = i, "cancelled during emission");
            return i;
        }
        sink.record(record);
    }
    records.len()
}

fn cancelled(mut summary: RunSummary, started: Instant, records: Vec<Record>) -> PipelineRun {
    summary.elapsed = started.elapsed();
    info!(count = records.len(), "scrape cancelled");
    PipelineRun {
        summary,
        outcome: Outcome::Cancelled { records },
    }
}

/// Run the pipeline on a background task, streaming events into `tx`.
///
/// A fatal error is sent as [`PipelineEvent::Failed`] and also returned from
/// the handle.
pub fn spawn_pipeline<B: Browser>(
    browser: Arc<B>,
    config: ScrapeConfig,
    tx: UnboundedSender<PipelineEvent>,
    cancel: CancelFlag,
) -> JoinHandle<Result<PipelineRun>> {
    tokio::spawn(async move {
        let sink = ChannelSink::new(tx);
        let result = run_pipeline(browser, &config, &sink, &cancel).await;
        if let Err(e) = &result {
            sink.failed(e.to_string());
        }
        result
    })
}
