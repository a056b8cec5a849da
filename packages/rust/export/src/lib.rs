//! Presentation layout and file export.
//!
//! - [`layout`] — the two-header-row analysis template and [`grid_rows`],
//!   shared by the spreadsheet writer and the terminal grid
//! - [`xlsx`] — workbook writer
//! - [`json`] — machine-readable dump

pub mod json;
pub mod layout;
pub mod xlsx;

pub use json::write_json;
pub use layout::{
    COLUMN_COUNT, COLUMN_WIDTHS, GridRow, MAIN_HEADERS, MERGED_HEADERS, RowKind, SUB_HEADERS,
    TIME_LABELS, grid_rows,
};
pub use xlsx::{WorkbookMeta, write_workbook};
