//! Row strategies for the base listing page.
//!
//! Each strategy is a pure function from a parsed document to raw rows. They
//! are tried in priority order and the first one that yields at least one
//! plausible row (one carrying a fixture identity) wins; the text scan is the
//! always-last fallback.

mod table;
mod text_scan;

use scraper::Html;

pub use table::SelectorStrategy;
pub use text_scan::TextScanStrategy;

// ---------------------------------------------------------------------------
// Raw rows
// ---------------------------------------------------------------------------

/// One candidate row, before any positional interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    /// Cell texts in document order, whitespace-collapsed.
    pub cells: Vec<String>,
    /// `href` values of every link inside the row, unresolved.
    pub links: Vec<String>,
    /// Attributes of the row element itself.
    pub attrs: Vec<(String, String)>,
}

impl RawRow {
    /// A row with only cell texts.
    pub fn from_cells<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: cells.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Cell at `idx`, or `""`.
    pub fn cell(&self, idx: usize) -> &str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }
}

/// Collapse runs of whitespace and trim.
pub fn clean_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let joined: String = parts.collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A way of finding fixture rows on the listing page.
pub trait RowStrategy: Send + Sync {
    /// Human-readable strategy name for tracing and the run summary.
    fn name(&self) -> &str;

    /// Every candidate row this strategy can see, plausible or not.
    fn rows(&self, doc: &Html) -> Vec<RawRow>;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds registered strategies in priority order.
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn RowStrategy>>,
}

impl StrategyRegistry {
    /// All built-in strategies, most specific first, text scan last.
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(SelectorStrategy::new(
                    "fixture-attribute",
                    "tr[data-matchnum], tr[fid]",
                )),
                Box::new(SelectorStrategy::new(
                    "known-table",
                    "table.bet-tb tr, .jczq-table tr, .odds-table tr",
                )),
                Box::new(SelectorStrategy::new("match-item", ".match-item")),
                Box::new(SelectorStrategy::new("tbody-rows", "tbody tr")),
                Box::new(SelectorStrategy::new("table-rows", "table tr")),
                Box::new(TextScanStrategy),
            ],
        }
    }

    /// Run strategies in order and return the first non-empty set of rows
    /// accepted by `plausible`, with the name of the strategy that found them.
    pub fn select(
        &self,
        doc: &Html,
        plausible: impl Fn(&RawRow) -> bool,
    ) -> Option<(&str, Vec<RawRow>)> {
        for strategy in &self.strategies {
            let rows: Vec<RawRow> = strategy
                .rows(doc)
                .into_iter()
                .filter(|row| plausible(row))
                .collect();
            if !rows.is_empty() {
                return Some((strategy.name(), rows));
            }
        }
        None
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
