//! Shared types, error model, and configuration for oddsboard.
//!
//! This crate is the foundation depended on by all other oddsboard crates.
//! It provides:
//! - [`OddsError`] — the unified error type
//! - Domain types ([`Record`], [`RecordSet`], [`Enrichment`], [`RunId`])
//! - Configuration ([`AppConfig`], [`ScrapeConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_SOURCE_URL, EnrichConfig, EnrichOptions, OutputConfig, PipelineConfig,
    ScrapeConfig, SourceConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{OddsError, Result};
pub use types::{Enrichment, OddsTriple, Record, RecordSet, RunId, Upsert, day_prefix};
