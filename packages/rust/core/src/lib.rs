//! Pipeline orchestration for oddsboard.
//!
//! This crate ties the listing extractor and the detail passes together into
//! one cancellable run (`run_pipeline`) and defines how results reach the
//! front ends (`EventSink`).

pub mod cancel;
pub mod events;
pub mod filter;
pub mod pipeline;

pub use cancel::CancelFlag;
pub use events::{ChannelSink, EventSink, PipelineEvent, SilentSink};
pub use filter::{same_day_filter, truncate};
pub use oddsboard_crawler::EnrichStats;
pub use pipeline::{Outcome, PipelineRun, RunSummary, run_pipeline, spawn_pipeline};
