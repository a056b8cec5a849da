//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use oddsboard_browser::Browser;
use oddsboard_core::{CancelFlag, EventSink, Outcome, PipelineRun, run_pipeline};
use oddsboard_export::{WorkbookMeta, write_json, write_workbook};
use oddsboard_shared::{AppConfig, Record, ScrapeConfig, init_config, load_config, load_config_from};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// oddsboard — Jingcai football odds scraper.
#[derive(Parser)]
#[command(
    name = "oddsboard",
    version,
    about = "Scrape the Jingcai football listing into an odds analysis workbook.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Export file format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    Xlsx,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scrape the listing page, enrich, and write the result file.
    Scrape(ScrapeArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `scrape`. Anything unset falls back to the config file.
#[derive(Args, Debug)]
pub(crate) struct ScrapeArgs {
    /// Listing page URL.
    #[arg(long)]
    pub url: Option<String>,

    /// Output file path.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Keep at most N fixtures (0 = unlimited).
    #[arg(long)]
    pub max: Option<usize>,

    /// Keep only fixtures from the first fixture's day.
    #[arg(long)]
    pub same_day: bool,

    /// Run the Asian handicap pass.
    #[arg(long)]
    pub asian: bool,

    /// Run the European odds / Kelly pass.
    #[arg(long)]
    pub kelly: bool,

    /// Run every detail pass.
    #[arg(long)]
    pub all_enrich: bool,

    /// Show the browser window (chrome backend only).
    #[arg(long)]
    pub no_headless: bool,

    /// Simultaneous detail page visits.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Output format.
    #[arg(long, value_enum, default_value = "xlsx")]
    pub format: OutputFormat,

    /// Read settings from this file instead of ~/.oddsboard/oddsboard.toml.
    #[arg(long, env = "ODDSBOARD_CONFIG")]
    pub config: Option<PathBuf>,
}

impl ScrapeArgs {
    /// Overlay the flags that were given onto `config`.
    fn apply(&self, config: &mut ScrapeConfig) {
        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(max) = self.max {
            config.max_records = max;
        }
        if let Some(concurrency) = self.concurrency {
            config.enrich.concurrency = concurrency;
        }
        config.same_day_only |= self.same_day;
        config.asian_handicap |= self.asian || self.all_enrich;
        config.kelly |= self.kelly || self.all_enrich;
        if self.no_headless {
            config.headless = false;
        }
        if self.format == OutputFormat::Json {
            config.output = config.output.with_extension("json");
        }
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "oddsboard=info",
        1 => "oddsboard=debug",
        _ => "oddsboard=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Scrape(args) => cmd_scrape(&args).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_scrape(args: &ScrapeArgs) -> Result<()> {
    let app = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let mut config = ScrapeConfig::from(&app);
    args.apply(&mut config);
    config.validate()?;

    info!(
        url = %config.url,
        asian = config.asian_handicap,
        kelly = config.kelly,
        max = config.max_records,
        "scraping"
    );

    #[cfg(feature = "chrome")]
    let browser = Arc::new(oddsboard_browser::ChromeBrowser::launch(config.headless)?);

    #[cfg(not(feature = "chrome"))]
    let browser = {
        if !config.headless {
            warn!("--no-headless has no effect without the chrome feature");
        }
        Arc::new(oddsboard_browser::HttpBrowser::new()?)
    };

    scrape_with(browser, &config, args.format).await
}

async fn scrape_with<B: Browser>(
    browser: Arc<B>,
    config: &ScrapeConfig,
    format: OutputFormat,
) -> Result<()> {
    let method = browser.name().to_string();

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let progress = CliProgress::new();
    let run = run_pipeline(browser, config, &progress, &cancel).await?;
    progress.finish();

    match &run.outcome {
        Outcome::Cancelled { records } => {
            println!(
                "  Scrape cancelled after {} fixtures; nothing written.",
                records.len()
            );
            return Ok(());
        }
        Outcome::Degraded { reason, .. } => {
            warn!(%reason, "live extraction failed, writing placeholder fixtures");
            eprintln!(
                "warning: live extraction failed ({reason}); output holds placeholder fixtures"
            );
        }
        Outcome::Completed { stats, .. } => {
            info!(
                enriched = stats.enriched,
                failed = stats.failed,
                skipped = stats.skipped,
                "enrichment totals"
            );
        }
    }

    export(&run, config, &method, format)?;
    print_summary(&run, &config.output);
    Ok(())
}

fn export(
    run: &PipelineRun,
    config: &ScrapeConfig,
    method: &str,
    format: OutputFormat,
) -> Result<()> {
    let records = run.outcome.records();
    match format {
        OutputFormat::Xlsx => {
            let mut meta = WorkbookMeta::new(&run.summary.source_url, method);
            meta.asian_handicap = run.summary.asian_handicap;
            meta.kelly = run.summary.kelly;
            if let Outcome::Degraded { reason, .. } = &run.outcome {
                meta.degraded = Some(reason.clone());
            }
            write_workbook(records, &config.output, &meta)?;
        }
        OutputFormat::Json => write_json(records, &run.summary.source_url, &config.output)?,
    }
    Ok(())
}

fn print_summary(run: &PipelineRun, output: &Path) {
    let summary = &run.summary;
    let records = run.outcome.records();

    println!();
    if run.outcome.is_degraded() {
        println!("  Scrape degraded: placeholder fixtures written.");
    } else {
        println!("  Scrape complete!");
    }
    println!("  Run:      {}", summary.run_id);
    println!("  Page:     {}", summary.page_title);
    println!("  Strategy: {}", summary.strategy.as_deref().unwrap_or("-"));
    println!("  Fixtures: {}", records.len());
    println!("  Asian:    {}", enriched_count(records, |r| r.asian_handicap.is_some()));
    println!("  Kelly:    {}", enriched_count(records, |r| r.kelly.is_some()));
    println!("  Output:   {}", output.display());
    println!("  Time:     {:.1}s", summary.elapsed.as_secs_f64());
    println!();
}

fn enriched_count(records: &[Record], has: impl Fn(&Record) -> bool) -> usize {
    records.iter().filter(|r| has(r)).count()
}

// ---------------------------------------------------------------------------
// CLI progress sink
// ---------------------------------------------------------------------------

/// Pipeline sink that drives an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
    records: AtomicUsize,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self {
            spinner,
            records: AtomicUsize::new(0),
        }
    }

    fn finish(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl EventSink for CliProgress {
    fn progress(&self, message: &str) {
        self.spinner.set_message(message.to_string());
    }

    fn record(&self, record: &Record) {
        let seen = self.records.fetch_add(1, Ordering::Relaxed) + 1;
        self.spinner.set_message(format!(
            "[{seen}] {} {} vs {}",
            record.match_id, record.home_team, record.away_team
        ));
    }

    fn finished(&self, _run: &PipelineRun) {
        self.spinner.finish_and_clear();
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
