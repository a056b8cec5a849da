//! CSS-selector row strategies.
//!
//! Table rows contribute their `td` cells. Non-table containers (`.match-item`
//! and friends) contribute the text of each child element instead.

use scraper::{ElementRef, Html, Selector};

use super::{RawRow, RowStrategy, clean_text};
use crate::links::is_detail_link;

/// Rows are the elements matched by one selector list.
pub struct SelectorStrategy {
    name: &'static str,
    selector: Selector,
    cell: Selector,
    anchor: Selector,
}

impl SelectorStrategy {
    /// `selector` is a compile-time constant; a typo is a programming error.
    pub fn new(name: &'static str, selector: &'static str) -> Self {
        Self {
            name,
            selector: Selector::parse(selector).expect("row selector"),
            cell: Selector::parse("td").expect("cell selector"),
            anchor: Selector::parse("a[href]").expect("anchor selector"),
        }
    }

    fn row(&self, el: ElementRef<'_>) -> RawRow {
        let links: Vec<String> = el
            .select(&self.anchor)
            .filter_map(|a| a.value().attr("href"))
            .map(str::to_string)
            .collect();

        let attrs = el
            .value()
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let tds: Vec<ElementRef<'_>> = el.select(&self.cell).collect();
        let cells = if tds.is_empty() {
            el.children()
                .filter_map(ElementRef::wrap)
                .map(|child| clean_text(child.text()))
                .filter(|text| !text.is_empty())
                .collect()
        } else {
            tds.into_iter()
                .filter(|td| !self.is_nav_cell(*td))
                .map(|td| clean_text(td.text()))
                .collect()
        };

        RawRow {
            cells,
            links,
            attrs,
        }
    }

    /// A cell that holds nothing but detail-page links ("亚 欧 析"). It is
    /// navigation, not data, and would otherwise shift bookmaker columns.
    fn is_nav_cell(&self, td: ElementRef<'_>) -> bool {
        let anchors: Vec<ElementRef<'_>> = td.select(&self.anchor).collect();
        if anchors.is_empty()
            || !anchors
                .iter()
                .any(|a| a.value().attr("href").is_some_and(is_detail_link))
        {
            return false;
        }
        let anchor_text: usize = anchors
            .iter()
            .map(|a| clean_text(a.text()).chars().filter(|c| !c.is_whitespace()).count())
            .sum();
        let cell_text = clean_text(td.text())
            .chars()
            .filter(|c| !c.is_whitespace())
            .count();
        cell_text == anchor_text
    }
}

impl RowStrategy for SelectorStrategy {
    fn name(&self) -> &str {
        self.name
    }

    fn rows(&self, doc: &Html) -> Vec<RawRow> {
        doc.select(&self.selector).map(|el| self.row(el)).collect()
    }
}
