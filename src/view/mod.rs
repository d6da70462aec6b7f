//! Views and their refresh coordination.

pub mod coordinator;
pub mod refresh;

use std::fmt;
use std::str::FromStr;

pub use coordinator::{ViewCoordinator, ViewCoordinatorBuilder};
pub use refresh::DiscoveryRefresh;

/// The view the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActiveView {
    Dashboard,
    Analytics,
    /// Item editor; reloads only on request
    Data,
    Collections,
    /// Signed out
    #[default]
    None,
}

impl ActiveView {
    /// Views reloaded when the server reports a data change.
    pub fn auto_refreshes(&self) -> bool {
        matches!(
            self,
            ActiveView::Dashboard | ActiveView::Analytics | ActiveView::Collections
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveView::Dashboard => "dashboard",
            ActiveView::Analytics => "analytics",
            ActiveView::Data => "data",
            ActiveView::Collections => "collections",
            ActiveView::None => "none",
        }
    }
}

impl fmt::Display for ActiveView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActiveView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dashboard" => Ok(ActiveView::Dashboard),
            "analytics" => Ok(ActiveView::Analytics),
            "data" => Ok(ActiveView::Data),
            "collections" => Ok(ActiveView::Collections),
            "none" => Ok(ActiveView::None),
            other => Err(format!("unknown view '{}'", other)),
        }
    }
}
