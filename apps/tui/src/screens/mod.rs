//! TUI screen definitions.
//!
//! Each screen corresponds to a tab in the TUI.

mod grid;
mod scrape;

pub(crate) use grid::draw_grid;
pub(crate) use scrape::ScrapeScreen;

use std::fmt;

/// Screen identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScreenId {
    Scrape,
    Grid,
}

impl ScreenId {
    pub(crate) const ALL: [ScreenId; 2] = [ScreenId::Scrape, ScreenId::Grid];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Scrape => 0,
            Self::Grid => 1,
        }
    }

    pub(crate) fn next(self) -> Self {
        match self {
            Self::Scrape => Self::Grid,
            Self::Grid => Self::Scrape,
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scrape => write!(f, "Scrape"),
            Self::Grid => write!(f, "Fixtures"),
        }
    }
}
