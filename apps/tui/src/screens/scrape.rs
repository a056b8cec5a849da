//! "Scrape" screen: listing URL, record limit, pass toggles, and the run log.

use std::collections::VecDeque;

use crossterm::event::KeyCode;
use oddsboard_shared::ScrapeConfig;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

/// Lines of run log kept on screen.
const LOG_LINES: usize = 200;

/// Which input field is focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Url,
    Max,
    SameDay,
    Asian,
    Kelly,
}

const FIELDS: [Field; 5] = [
    Field::Url,
    Field::Max,
    Field::SameDay,
    Field::Asian,
    Field::Kelly,
];

pub(crate) struct ScrapeScreen {
    url: String,
    max: String,
    same_day: bool,
    asian: bool,
    kelly: bool,
    focused: Field,
    editing: bool,
    log: VecDeque<String>,
}

impl ScrapeScreen {
    /// Seed the form from the loaded configuration.
    pub(crate) fn new(config: &ScrapeConfig) -> Self {
        Self {
            url: config.url.clone(),
            max: if config.max_records == 0 {
                String::new()
            } else {
                config.max_records.to_string()
            },
            same_day: config.same_day_only,
            asian: config.asian_handicap,
            kelly: config.kelly,
            focused: Field::Url,
            editing: false,
            log: VecDeque::new(),
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.editing
    }

    /// Overlay the form onto `config`. Fails with a message for the status bar.
    pub(crate) fn apply(&self, config: &mut ScrapeConfig) -> Result<(), String> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err("URL is empty".to_string());
        }
        let max = match self.max.trim() {
            "" => 0,
            text => text
                .parse::<usize>()
                .map_err(|_| format!("max fixtures must be a number, got '{text}'"))?,
        };

        config.url = url.to_string();
        config.max_records = max;
        config.same_day_only = self.same_day;
        config.asian_handicap = self.asian;
        config.kelly = self.kelly;
        Ok(())
    }

    pub(crate) fn log(&mut self, line: impl Into<String>) {
        if self.log.len() == LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back(line.into());
    }

    pub(crate) fn clear_log(&mut self) {
        self.log.clear();
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, running: bool) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // URL
                Constraint::Length(3), // Max
                Constraint::Length(3), // Toggles
                Constraint::Length(1), // Action hint
                Constraint::Min(1),    // Run log
            ])
            .split(area);

        let url = Paragraph::new(self.url.as_str()).block(self.field_block(Field::Url, " URL "));
        f.render_widget(url, chunks[0]);

        let max_text = if self.max.is_empty() && !self.editing {
            "unlimited"
        } else {
            self.max.as_str()
        };
        let max = Paragraph::new(max_text).block(self.field_block(Field::Max, " Max fixtures "));
        f.render_widget(max, chunks[1]);

        let toggles = Line::from(vec![
            self.toggle_span(Field::SameDay, "Same day only", self.same_day),
            Span::raw("   "),
            self.toggle_span(Field::Asian, "Asian handicap", self.asian),
            Span::raw("   "),
            self.toggle_span(Field::Kelly, "Kelly", self.kelly),
        ]);
        let toggles = Paragraph::new(toggles).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Detail passes "),
        );
        f.render_widget(toggles, chunks[2]);

        let hint = if self.editing {
            "Type to edit · Enter/Esc to stop editing"
        } else if running {
            "Scrape running · Esc to cancel"
        } else {
            "↑/↓ select · Space edit/toggle · Enter start · e export · ? help"
        };
        let hint = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(hint, chunks[3]);

        let items: Vec<ListItem> = self
            .log
            .iter()
            .rev()
            .take(chunks[4].height.saturating_sub(2) as usize)
            .map(|line| ListItem::new(line.as_str()))
            .collect();
        let log = List::new(items).block(Block::default().borders(Borders::ALL).title(" Run log "));
        f.render_widget(log, chunks[4]);
    }

    fn field_style(&self, field: Field) -> Style {
        if self.focused == field && self.editing {
            Style::default().fg(Color::Yellow)
        } else if self.focused == field {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        }
    }

    fn field_block(&self, field: Field, title: &'static str) -> Block<'static> {
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(self.field_style(field))
    }

    fn toggle_span(&self, field: Field, label: &str, on: bool) -> Span<'static> {
        let mark = if on { "[x]" } else { "[ ]" };
        Span::styled(format!("{mark} {label}"), self.field_style(field))
    }

    /// Handle a key while the form is focused. Enter outside editing is left
    /// to the caller, which owns the pipeline.
    pub(crate) fn handle_key(&mut self, code: KeyCode) {
        if self.editing {
            match code {
                KeyCode::Esc | KeyCode::Enter => self.editing = false,
                KeyCode::Backspace => {
                    if let Some(text) = self.current_text_mut() {
                        text.pop();
                    }
                }
                KeyCode::Char(c) => {
                    let digits_only = self.focused == Field::Max;
                    if let Some(text) = self.current_text_mut() {
                        if !digits_only || c.is_ascii_digit() {
                            text.push(c);
                        }
                    }
                }
                _ => {}
            }
            return;
        }

        match code {
            KeyCode::Up | KeyCode::Char('k') => self.step(-1),
            KeyCode::Down | KeyCode::Char('j') => self.step(1),
            KeyCode::Char(' ') => match self.focused {
                Field::Url | Field::Max => self.editing = true,
                Field::SameDay => self.same_day = !self.same_day,
                Field::Asian => self.asian = !self.asian,
                Field::Kelly => self.kelly = !self.kelly,
            },
            _ => {}
        }
    }

    fn current_text_mut(&mut self) -> Option<&mut String> {
        match self.focused {
            Field::Url => Some(&mut self.url),
            Field::Max => Some(&mut self.max),
            _ => None,
        }
    }

    fn step(&mut self, delta: isize) {
        let idx = FIELDS.iter().position(|f| *f == self.focused).unwrap_or(0) as isize;
        let len = FIELDS.len() as isize;
        self.focused = FIELDS[(idx + delta).rem_euclid(len) as usize];
    }
}
