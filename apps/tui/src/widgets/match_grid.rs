//! Live fixture grid: one block (match row + time rows) per record, keyed by
//! identity so re-emitted records update their block in place.

use oddsboard_export::{GridRow, grid_rows};
use oddsboard_shared::{Record, RecordSet, Upsert};

#[derive(Debug, Default)]
pub(crate) struct MatchGrid {
    records: RecordSet,
    /// First visible display row.
    offset: usize,
}

impl MatchGrid {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
        self.offset = 0;
    }

    /// Add a new fixture block or refresh the existing one for this identity.
    pub(crate) fn upsert(&mut self, record: Record) -> Upsert {
        self.records.upsert(record)
    }

    /// Replace the whole grid with the final batch.
    pub(crate) fn rebuild(&mut self, records: &[Record]) {
        self.clear();
        for record in records {
            self.records.upsert(record.clone());
        }
        self.scroll_to_top();
    }

    pub(crate) fn scroll_to_top(&mut self) {
        self.offset = 0;
    }

    pub(crate) fn scroll_down(&mut self, by: usize) {
        let last = self.row_count().saturating_sub(1);
        self.offset = (self.offset + by).min(last);
    }

    pub(crate) fn scroll_up(&mut self, by: usize) {
        self.offset = self.offset.saturating_sub(by);
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether every fixture on screen is a placeholder.
    pub(crate) fn is_all_fallback(&self) -> bool {
        self.records.is_all_fallback()
    }

    pub(crate) fn records(&self) -> &[Record] {
        self.records.as_slice()
    }

    /// Display rows in record order.
    pub(crate) fn rows(&self) -> Vec<GridRow> {
        self.records.iter().flat_map(grid_rows).collect()
    }

    fn row_count(&self) -> usize {
        self.records
            .iter()
            .map(|r| grid_rows(r).len())
            .sum()
    }
}
