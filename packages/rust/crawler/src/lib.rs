//! Listing-page extraction and per-fixture detail enrichment.
//!
//! This crate provides:
//! - [`strategies`] — ordered row strategies for the listing page
//! - [`extractor`] — positional row parsing, fallback records, [`extract_base`]
//! - [`links`] — detail-page classification and sibling URL derivation
//! - [`detail`] — Asian handicap and Kelly passes with their value rules
//! - [`enricher`] — bounded-concurrency fan-out that applies a pass

pub mod detail;
pub mod enricher;
pub mod extractor;
pub mod links;
pub mod strategies;

pub use detail::{AsianHandicapPass, DetailPass, KellyPass};
pub use enricher::{EnrichStats, enrich};
pub use extractor::{
    BASE_READY_SELECTOR, Extraction, IDENTITY, extract_base, fallback_records, records_from_html,
};
pub use links::{DetailKind, DetailLinks};
pub use strategies::{RawRow, RowStrategy, StrategyRegistry};
