//! View refresh and rendering seams.

use async_trait::async_trait;

use crate::discovery::CollectionSet;
use crate::error::ConsoleResult;
use crate::view::ActiveView;

/// Reloads one view.
///
/// The coordinator calls this when real-time notifications invalidate the
/// active view, and when the user switches to it.
#[async_trait]
pub trait ViewRefresh: Send + Sync {
    /// Reload the view's data and hand it to rendering.
    async fn refresh(&self) -> ConsoleResult<()>;
}

/// Receives a fresh collection snapshot for a view.
///
/// Every snapshot fully replaces the previous one.
pub trait SnapshotRenderer: Send + Sync {
    /// Render `snapshot` for `view`.
    fn render(&self, view: ActiveView, snapshot: &CollectionSet);
}
