//! Last-resort strategy: scavenge identity tokens from the page text.

use std::collections::HashSet;

use scraper::{Html, Selector};

use super::{RawRow, RowStrategy};
use crate::extractor::IDENTITY;

/// One single-cell row per distinct identity token found in `<body>` text.
pub struct TextScanStrategy;

impl RowStrategy for TextScanStrategy {
    fn name(&self) -> &str {
        "text-scan"
    }

    fn rows(&self, doc: &Html) -> Vec<RawRow> {
        let Ok(body_sel) = Selector::parse("body") else {
            return Vec::new();
        };
        let text: String = match doc.select(&body_sel).next() {
            Some(body) => body.text().collect(),
            None => doc.root_element().text().collect(),
        };

        let mut seen = HashSet::new();
        IDENTITY
            .find_iter(&text)
            .map(|m| m.as_str())
            .filter(|token| seen.insert(*token))
            .map(|token| RawRow::from_cells([token]))
            .collect()
    }
}
