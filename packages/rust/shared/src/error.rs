//! Error types for oddsboard.
//!
//! Library crates use [`OddsError`] via `thiserror`.
//! App crates (cli/tui) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all oddsboard operations.
#[derive(Debug, thiserror::Error)]
pub enum OddsError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while loading a page or raw data.
    #[error("network error: {0}")]
    Network(String),

    /// A network-bound step exceeded its time budget.
    #[error("timed out after {secs}s: {what}")]
    Timeout { what: String, secs: u64 },

    /// HTML/JSON parsing or content extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The browser-automation engine could not be constructed or launched.
    #[error("browser error: {0}")]
    Browser(String),

    /// Spreadsheet or dump writing error.
    #[error("export error: {0}")]
    Export(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad identity, empty batch, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, OddsError>;

impl OddsError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a timeout error for the named step.
    pub fn timeout(what: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            what: what.into(),
            secs,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the automation engine itself is unusable.
    ///
    /// Everything else is recoverable: page-level errors are swallowed by the
    /// enricher and base-page errors turn into fallback records.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Browser(_) | Self::Config { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = OddsError::config("concurrency must be at least 1");
        assert_eq!(err.to_string(), "config error: concurrency must be at least 1");

        let err = OddsError::timeout("https://live.500.com/", 30);
        assert!(err.to_string().contains("timed out after 30s"));
    }

    #[test]
    fn only_setup_errors_are_fatal() {
        assert!(OddsError::Browser("chrome not found".into()).is_fatal());
        assert!(!OddsError::Network("connection reset".into()).is_fatal());
        assert!(!OddsError::timeout("page", 5).is_fatal());
        assert!(!OddsError::parse("no rows").is_fatal());
    }
}
