//! oddsboard TUI: run scrapes interactively and watch fixtures fill in.
//!
//! Built with `ratatui` + `crossterm`. The pipeline runs on a background
//! tokio task and streams events back to the render loop.

mod app;
mod screens;
mod widgets;

use std::sync::Mutex;

use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    color_eyre::install()?;
    init_file_logging();

    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();
    app::run()
}

/// The terminal belongs to the UI, so logs go to `~/.oddsboard/tui.log`.
/// Logging is skipped when that file cannot be created.
fn init_file_logging() {
    let Ok(dir) = oddsboard_shared::config_dir() else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::File::create(dir.join("tui.log")) else {
        return;
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("oddsboard=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
}
