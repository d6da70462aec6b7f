//! Standard refresh for snapshot-driven views.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::ActiveView;
use crate::discovery::CollectionDiscovery;
use crate::error::ConsoleResult;
use crate::session::SharedSession;
use crate::traits::{SnapshotRenderer, ViewRefresh};

/// Re-runs discovery with the current session and renders the snapshot.
pub struct DiscoveryRefresh {
    view: ActiveView,
    discovery: CollectionDiscovery,
    session: SharedSession,
    renderer: Arc<dyn SnapshotRenderer>,
}

impl DiscoveryRefresh {
    pub fn new(
        view: ActiveView,
        discovery: CollectionDiscovery,
        session: SharedSession,
        renderer: Arc<dyn SnapshotRenderer>,
    ) -> Self {
        Self {
            view,
            discovery,
            session,
            renderer,
        }
    }
}

#[async_trait]
impl ViewRefresh for DiscoveryRefresh {
    async fn refresh(&self) -> ConsoleResult<()> {
        let session = self.session.snapshot();
        let snapshot = self.discovery.discover_all(&session).await?;
        debug!(
            "Rendering {} with {} collections",
            self.view,
            snapshot.len()
        );
        self.renderer.render(self.view, &snapshot);
        Ok(())
    }
}
