//! Core TUI application state and event loop.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use oddsboard_core::{CancelFlag, Outcome, PipelineEvent, PipelineRun, spawn_pipeline};
use oddsboard_export::{WorkbookMeta, write_workbook};
use oddsboard_shared::{OddsError, ScrapeConfig, load_config};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use tokio::sync::mpsc::{self, UnboundedReceiver, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::screens::{ScrapeScreen, ScreenId, draw_grid};
use crate::widgets::{MatchGrid, popup, status_bar};

/// Rows moved by PageUp/PageDown on the grid.
const PAGE: usize = 20;

/// A scrape running on the background runtime.
struct Job {
    rx: UnboundedReceiver<PipelineEvent>,
    cancel: CancelFlag,
    handle: JoinHandle<oddsboard_shared::Result<PipelineRun>>,
    method: String,
}

/// Modal shown over the screens until dismissed.
struct Popup {
    title: String,
    message: String,
    color: Color,
}

/// Application state.
pub(crate) struct App {
    pub active: ScreenId,
    pub form: ScrapeScreen,
    pub grid: MatchGrid,
    pub should_quit: bool,
    /// Status message shown in bottom bar.
    pub status: String,
    pub show_help: bool,
    popup: Option<Popup>,
    config: ScrapeConfig,
    job: Option<Job>,
    /// Provenance of the grid contents, for export.
    last_run: Option<(PipelineRun, String)>,
}

impl App {
    pub(crate) fn new(config: ScrapeConfig) -> Self {
        Self {
            active: ScreenId::Scrape,
            form: ScrapeScreen::new(&config),
            grid: MatchGrid::new(),
            should_quit: false,
            status: "Ready — press Enter to scrape, ? for help".to_string(),
            show_help: false,
            popup: None,
            config,
            job: None,
            last_run: None,
        }
    }

    fn is_running(&self) -> bool {
        self.job.is_some()
    }

    fn start_scrape(&mut self) {
        if self.is_running() {
            self.status = "A scrape is already running".to_string();
            return;
        }

        let mut config = self.config.clone();
        if let Err(message) = self.form.apply(&mut config) {
            self.status = message;
            return;
        }
        if let Err(e) = config.validate() {
            self.status = e.to_string();
            return;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancelFlag::new();

        let spawned = launch(config.clone(), tx, cancel.clone());
        let (handle, method) = match spawned {
            Ok(job) => job,
            Err(e) => {
                self.show_error("Browser unavailable", e.to_string());
                return;
            }
        };

        info!(url = %config.url, %method, "scrape started");
        self.grid.clear();
        self.form.clear_log();
        self.form.log(format!("Scraping {}", config.url));
        self.status = "Scraping…".to_string();
        self.config = config;
        self.job = Some(Job {
            rx,
            cancel,
            handle,
            method,
        });
    }

    fn cancel_scrape(&mut self) {
        if let Some(job) = &self.job {
            job.cancel.cancel();
            self.status = "Cancelling…".to_string();
            self.form.log("Cancel requested");
        }
    }

    /// Drain every pending pipeline event. Called once per tick.
    fn drain_events(&mut self) {
        loop {
            let Some(job) = self.job.as_mut() else {
                return;
            };
            match job.rx.try_recv() {
                Ok(event) => self.handle_event(event),
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    if let Some(job) = self.job.take() {
                        if job.cancel.is_cancelled() {
                            self.status = format!("Cancelled with {} fixtures", self.grid.len());
                            self.form.log("Scrape cancelled");
                        }
                    }
                    return;
                }
            }
        }
    }

    fn handle_event(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::Progress(message) => {
                self.status = message.clone();
                self.form.log(message);
            }
            PipelineEvent::Record(record) => {
                self.grid.upsert(*record);
            }
            PipelineEvent::Finished(run) => {
                let run = *run;
                self.grid.rebuild(run.outcome.records());

                let summary = &run.summary;
                let line = format!(
                    "Finished: {} fixtures in {:.1}s",
                    run.outcome.records().len(),
                    summary.elapsed.as_secs_f64()
                );
                self.form.log(line.clone());
                self.status = line;

                if let Outcome::Degraded { reason, .. } = &run.outcome {
                    warn!(%reason, "degraded run");
                    self.popup = Some(Popup {
                        title: "Live data unavailable".to_string(),
                        message: format!(
                            "{reason}\n\nThe grid holds placeholder fixtures. Check the URL or try again later."
                        ),
                        color: Color::Yellow,
                    });
                }

                let method = self
                    .job
                    .as_ref()
                    .map(|job| job.method.clone())
                    .unwrap_or_default();
                self.last_run = Some((run, method));
                self.active = ScreenId::Grid;
            }
            PipelineEvent::Failed(message) => {
                self.form.log(format!("Failed: {message}"));
                self.show_error("Scrape failed", message);
            }
        }
    }

    fn export(&mut self) {
        if self.is_running() {
            self.status = "Wait for the scrape to finish before exporting".to_string();
            return;
        }
        if self.grid.is_empty() {
            self.status = "Nothing to export".to_string();
            return;
        }

        let meta = self.workbook_meta();
        match write_workbook(self.grid.records(), &self.config.output, &meta) {
            Ok(()) => {
                self.status = format!("Exported to {}", self.config.output.display());
                self.form.log(self.status.clone());
            }
            Err(e) => self.show_error("Export failed", e.to_string()),
        }
    }

    /// Info-sheet metadata for the grid as it stands.
    fn workbook_meta(&self) -> WorkbookMeta {
        let mut meta = match &self.last_run {
            Some((run, method)) => {
                let mut meta = WorkbookMeta::new(&run.summary.source_url, method.as_str());
                meta.asian_handicap = run.summary.asian_handicap;
                meta.kelly = run.summary.kelly;
                if let Outcome::Degraded { reason, .. } = &run.outcome {
                    meta.degraded = Some(reason.clone());
                }
                meta
            }
            None => WorkbookMeta::new(&self.config.url, "unknown"),
        };
        // A cancelled degraded run leaves placeholders without a finished run.
        if meta.degraded.is_none() && self.grid.is_all_fallback() {
            meta.degraded = Some("placeholder records only".to_string());
        }
        meta
    }

    fn show_error(&mut self, title: &str, message: String) {
        warn!(title, %message, "showing error");
        self.status = format!("{title}: {message}");
        self.popup = Some(Popup {
            title: title.to_string(),
            message,
            color: Color::Red,
        });
    }

    fn shutdown(&mut self) {
        if let Some(job) = self.job.take() {
            job.cancel.cancel();
            job.handle.abort();
        }
    }
}

/// Start the pipeline on the ambient runtime with the configured backend.
fn launch(
    config: ScrapeConfig,
    tx: mpsc::UnboundedSender<PipelineEvent>,
    cancel: CancelFlag,
) -> Result<(JoinHandle<oddsboard_shared::Result<PipelineRun>>, String), OddsError> {
    #[cfg(feature = "chrome")]
    let browser = Arc::new(oddsboard_browser::ChromeBrowser::launch(config.headless)?);
    #[cfg(not(feature = "chrome"))]
    let browser = Arc::new(oddsboard_browser::HttpBrowser::new()?);

    let method = oddsboard_browser::Browser::name(browser.as_ref()).to_string();
    Ok((spawn_pipeline(browser, config, tx, cancel), method))
}

/// Entry point — sets up terminal, runs event loop, restores terminal.
pub(crate) fn run() -> Result<()> {
    let config = match load_config() {
        Ok(app) => ScrapeConfig::from(&app),
        Err(e) => {
            warn!(error = %e, "config unreadable, using defaults");
            ScrapeConfig::default()
        }
    };

    // Setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let mut app = App::new(config);
    let result = run_app(&mut terminal, &mut app);
    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.drain_events();
        terminal.draw(|f| draw(f, app))?;

        // Poll for events with 100ms timeout for responsive UI
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                handle_key(app, key.code, key.modifiers);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    if matches!(code, KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL)) {
        app.should_quit = true;
        return;
    }

    // Modals swallow the next key.
    if app.popup.is_some() {
        app.popup = None;
        return;
    }
    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.active == ScreenId::Scrape && app.form.is_editing() {
        app.form.handle_key(code);
        return;
    }

    match code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Esc if app.is_running() => app.cancel_scrape(),
        KeyCode::Enter => app.start_scrape(),
        KeyCode::Char('e') => app.export(),
        KeyCode::Tab | KeyCode::BackTab => app.active = app.active.next(),
        KeyCode::Char(c @ '1'..='2') => {
            let idx = (c as usize) - ('1' as usize);
            app.active = ScreenId::ALL[idx];
        }
        _ => match app.active {
            ScreenId::Scrape => app.form.handle_key(code),
            ScreenId::Grid => match code {
                KeyCode::Down | KeyCode::Char('j') => app.grid.scroll_down(1),
                KeyCode::Up | KeyCode::Char('k') => app.grid.scroll_up(1),
                KeyCode::PageDown => app.grid.scroll_down(PAGE),
                KeyCode::PageUp => app.grid.scroll_up(PAGE),
                KeyCode::Home | KeyCode::Char('g') => app.grid.scroll_to_top(),
                _ => {}
            },
        },
    }
}

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    let tab_titles: Vec<Line> = ScreenId::ALL
        .iter()
        .map(|s| Line::from(format!("{s}")))
        .collect();

    let title = if app.is_running() {
        " oddsboard · running "
    } else {
        " oddsboard "
    };
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(title))
        .select(app.active.index())
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .divider(" │ ");
    f.render_widget(tabs, chunks[0]);

    match app.active {
        ScreenId::Scrape => app.form.draw(f, chunks[1], app.is_running()),
        ScreenId::Grid => draw_grid(f, chunks[1], &app.grid),
    }

    f.render_widget(status_bar(&app.status), chunks[2]);

    if app.show_help {
        draw_help_overlay(f);
    }
    if let Some(p) = &app.popup {
        popup(f, &p.title, &p.message, p.color);
    }
}

fn draw_help_overlay(f: &mut Frame) {
    let area = crate::widgets::centered_rect(60, 60, f.area());

    let help_text = vec![
        Line::from("Keybindings").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::from("  1-2 / Tab    Switch screen"),
        Line::from("  Enter        Start a scrape"),
        Line::from("  Esc          Cancel the running scrape"),
        Line::from("  e            Export the grid to xlsx"),
        Line::from("  ?            Toggle this help"),
        Line::from("  q / Ctrl-C   Quit"),
        Line::from(""),
        Line::from("Scrape form:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  ↑/↓          Select field"),
        Line::from("  Space        Edit text / flip toggle"),
        Line::from(""),
        Line::from("Fixtures:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  ↑/↓ PgUp/PgDn Scroll"),
        Line::from("  g / Home     Back to top"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help — press any key to close ")
                .style(Style::default().bg(Color::DarkGray)),
        )
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));

    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(help, area);
}
