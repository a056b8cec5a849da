//! Detail passes: per-fixture secondary pages and their value-selection rules.
//!
//! A pass knows which URL to visit for a record, what marks the page as
//! rendered, and how to pick values out of the target bookmaker's row. The
//! same row rule runs over rendered HTML and over the raw JSON payload that
//! serves as the fallback when the page shows no clean values.

mod asian;
mod kelly;

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use oddsboard_shared::{EnrichOptions, Enrichment, Record};

use crate::links::{DetailKind, raw_data_url};
use crate::strategies::clean_text;

pub use asian::AsianHandicapPass;
pub use kelly::KellyPass;

static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("numeric regex"));

static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("row selector"));
static CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("cell selector"));

/// Glyphs the site appends to a value that moved since the opening line.
pub const TREND_GLYPHS: [char; 6] = ['↑', '↓', '▲', '▼', '升', '降'];

// ---------------------------------------------------------------------------
// Value rules
// ---------------------------------------------------------------------------

/// Whether the text carries a movement marker.
pub fn has_trend_glyph(text: &str) -> bool {
    text.chars().any(|c| TREND_GLYPHS.contains(&c))
}

/// Plain decimal text with no movement marker (`"0.92"`, `"3"`).
pub fn is_clean_numeric(text: &str) -> bool {
    let text = text.trim();
    !has_trend_glyph(text) && NUMERIC.is_match(text)
}

/// Value cells of the first row whose label contains `marker`: everything
/// after the label cell.
fn values_after_marker<'a>(
    rows: impl Iterator<Item = Vec<String>> + 'a,
    marker: &'a str,
) -> impl Iterator<Item = Vec<String>> + 'a {
    rows.filter_map(move |cells| {
        let label = cells.iter().position(|c| c.contains(marker))?;
        Some(cells[label + 1..].to_vec())
    })
}

/// `td` texts of every table row in the document.
pub fn html_rows(doc: &Html) -> Vec<Vec<String>> {
    doc.select(&ROW)
        .map(|tr| tr.select(&CELL).map(|td| clean_text(td.text())).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect()
}

/// Rows of a raw data payload. Accepts a top-level array, or an object whose
/// first array-valued field holds the rows. Each row is an array of scalars or
/// an object whose values are taken in map order.
pub fn json_rows(payload: &Value) -> Vec<Vec<String>> {
    let rows: &[Value] = match payload {
        Value::Array(rows) => rows.as_slice(),
        Value::Object(map) => map
            .values()
            .find_map(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };

    rows.iter()
        .filter_map(|row| match row {
            Value::Array(items) => Some(items.iter().map(scalar_text).collect()),
            Value::Object(map) => Some(map.values().map(scalar_text).collect()),
            _ => None,
        })
        .collect()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// One kind of per-record detail visit.
pub trait DetailPass: Send + Sync + 'static {
    /// Short pass name for tracing and progress text.
    fn name(&self) -> &'static str;

    /// Which detail page family this pass reads.
    fn kind(&self) -> DetailKind;

    /// Page to visit for `record`; `None` skips the record.
    fn detail_url<'a>(&self, record: &'a Record) -> Option<&'a str>;

    /// CSS selector that marks the page as rendered.
    fn ready_selector(&self) -> &str {
        "#datatb"
    }

    /// Bookmaker label to look for.
    fn marker<'a>(&self, opts: &'a EnrichOptions) -> &'a str;

    /// Pick values from the value cells of the bookmaker's row.
    fn from_values(&self, values: &[String]) -> Option<Enrichment>;

    /// Apply the row rule to rendered HTML.
    fn extract(&self, doc: &Html, marker: &str) -> Option<Enrichment> {
        values_after_marker(html_rows(doc).into_iter(), marker)
            .find_map(|values| self.from_values(&values))
    }

    /// Apply the row rule to a raw data payload.
    fn extract_raw(&self, payload: &Value, marker: &str) -> Option<Enrichment> {
        values_after_marker(json_rows(payload).into_iter(), marker)
            .find_map(|values| self.from_values(&values))
    }

    /// Raw structured-data endpoint for a detail page.
    fn raw_url(&self, detail_url: &str) -> Option<String> {
        raw_data_url(detail_url, self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_rule() {
        assert!(is_clean_numeric("0.92"));
        assert!(is_clean_numeric(" 3 "));
        assert!(!is_clean_numeric("0.92↑"));
        assert!(!is_clean_numeric("升"));
        assert!(!is_clean_numeric("-0.5"));
        assert!(!is_clean_numeric("半球"));
        assert!(!is_clean_numeric(""));
    }

    #[test]
    fn json_rows_accepts_arrays_and_objects() {
        let payload: Value = serde_json::json!({
            "status": 1,
            "rows": [
                ["威廉希尔", "0.91", 0.95, "0.97"],
                {"name": "立博", "w": "0.90"}
            ]
        });
        let rows = json_rows(&payload);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ["威廉希尔", "0.91", "0.95", "0.97"]);
        assert_eq!(rows[1][0], "立博");
    }

    #[test]
    fn json_rows_of_scalar_is_empty() {
        assert!(json_rows(&Value::Null).is_empty());
    }
}
