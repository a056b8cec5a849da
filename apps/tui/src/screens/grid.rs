//! "Fixtures" screen: the analysis grid, laid out like the exported sheet.

use oddsboard_export::{COLUMN_WIDTHS, RowKind, SUB_HEADERS};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use crate::widgets::MatchGrid;

pub(crate) fn draw_grid(f: &mut Frame, area: Rect, grid: &MatchGrid) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Fixtures ({}) ", grid.len()));

    if grid.is_empty() {
        let empty = Paragraph::new("No fixtures yet.\n\nStart a scrape from the Scrape tab.")
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    // Borders plus the header row.
    let visible = area.height.saturating_sub(3) as usize;
    let rows: Vec<Row> = grid
        .rows()
        .into_iter()
        .skip(grid.offset())
        .take(visible)
        .map(|row| {
            let kind = row.kind;
            let cells = row.cells.into_iter().enumerate().map(|(col, text)| {
                let style = match (kind, col) {
                    (RowKind::Match, _) => Style::default()
                        .fg(Color::Black)
                        .bg(Color::LightYellow)
                        .add_modifier(Modifier::BOLD),
                    (RowKind::Time, 0) => Style::default().fg(Color::Gray),
                    (RowKind::Time, _) => Style::default(),
                };
                Cell::from(text).style(style)
            });
            Row::new(cells)
        })
        .collect();

    let header = Row::new(SUB_HEADERS.iter().map(|h| Cell::from(*h))).style(
        Style::default()
            .fg(Color::White)
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD),
    );
    let widths = COLUMN_WIDTHS.iter().map(|w| Constraint::Length(*w));

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(block);
    f.render_widget(table, area);
}
