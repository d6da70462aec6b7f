//! Routes server-pushed changes to the active view.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::ActiveView;
use crate::error::ConsoleResult;
use crate::realtime::{RealtimeChannel, RealtimeEvent, RealtimeSubscriber, SubscriberError, SubscriptionId};
use crate::traits::ViewRefresh;

/// Decides which view to reload, and when.
///
/// Data changes reported by the real-time channel schedule a refresh of the
/// active view if it is one of the auto-refreshing views. Requests are
/// coalesced: at most one waits while a refresh runs, so a burst of events
/// costs at most one extra reload. A worker task runs the refreshes and
/// always reloads the view that is active when the refresh starts.
///
/// # Example
///
/// ```ignore
/// let views = ViewCoordinator::builder()
///     .with_refresh(ActiveView::Dashboard, dashboard_refresh)
///     .with_refresh(ActiveView::Analytics, analytics_refresh)
///     .build();
/// views.attach(&channel);
/// views.switch_view(ActiveView::Analytics);
/// ```
#[derive(Clone)]
pub struct ViewCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    active: RwLock<ActiveView>,
    refreshers: HashMap<ActiveView, Arc<dyn ViewRefresh>>,
    pending: mpsc::Sender<()>,
    completed: AtomicU64,
}

/// Builder for [`ViewCoordinator`].
#[derive(Default)]
pub struct ViewCoordinatorBuilder {
    refreshers: HashMap<ActiveView, Arc<dyn ViewRefresh>>,
    initial: ActiveView,
}

impl ViewCoordinatorBuilder {
    /// Register the refresh action of `view`.
    pub fn with_refresh(mut self, view: ActiveView, refresh: Arc<dyn ViewRefresh>) -> Self {
        self.refreshers.insert(view, refresh);
        self
    }

    pub fn initial_view(mut self, view: ActiveView) -> Self {
        self.initial = view;
        self
    }

    /// Build the coordinator and start its worker.
    ///
    /// Must be called within a Tokio runtime.
    pub fn build(self) -> ViewCoordinator {
        let (pending, requests) = mpsc::channel(1);
        let inner = Arc::new(Inner {
            active: RwLock::new(self.initial),
            refreshers: self.refreshers,
            pending,
            completed: AtomicU64::new(0),
        });
        tokio::spawn(run_refreshes(Arc::downgrade(&inner), requests));
        ViewCoordinator { inner }
    }
}

impl ViewCoordinator {
    pub fn builder() -> ViewCoordinatorBuilder {
        ViewCoordinatorBuilder::default()
    }

    pub fn active_view(&self) -> ActiveView {
        *self
            .inner
            .active
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Change the view that real-time changes are routed to.
    pub fn set_active_view(&self, view: ActiveView) {
        *self
            .inner
            .active
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = view;
    }

    /// Change the active view and schedule a load of it.
    pub fn switch_view(&self, view: ActiveView) {
        info!("Switching to view: {}", view);
        self.set_active_view(view);
        if self.inner.refreshers.contains_key(&view) {
            self.request_refresh();
        }
    }

    /// Schedule a refresh of whatever view is active when it runs.
    ///
    /// Returns false when a request was already pending.
    pub fn request_refresh(&self) -> bool {
        match self.inner.pending.try_send(()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(())) => {
                debug!("Refresh already pending");
                false
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                warn!("Refresh worker has stopped");
                false
            }
        }
    }

    /// Reload the active view now, on the caller's task.
    pub async fn refresh_active(&self) -> ConsoleResult<()> {
        let view = self.active_view();
        match self.inner.refreshers.get(&view) {
            Some(refresh) => {
                let result = refresh.refresh().await;
                self.inner.completed.fetch_add(1, Ordering::SeqCst);
                result
            }
            None => Ok(()),
        }
    }

    /// React to one real-time event.
    pub fn handle_event(&self, event: &RealtimeEvent) {
        if !event.is_data_change() {
            return;
        }
        let view = self.active_view();
        if view.auto_refreshes() {
            debug!("Auto-refreshing {} after {:?}", view, event);
            self.request_refresh();
        }
    }

    /// Subscribe to `channel`.
    pub fn attach(&self, channel: &RealtimeChannel) -> SubscriptionId {
        channel.subscribe(Arc::new(self.clone()))
    }

    /// Refreshes run so far, failed ones included.
    pub fn refresh_count(&self) -> u64 {
        self.inner.completed.load(Ordering::SeqCst)
    }
}

impl RealtimeSubscriber for ViewCoordinator {
    fn on_event(&self, event: &RealtimeEvent) -> Result<(), SubscriberError> {
        self.handle_event(event);
        Ok(())
    }
}

impl std::fmt::Debug for ViewCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewCoordinator")
            .field("active", &self.active_view())
            .field("views", &self.inner.refreshers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Worker: one refresh per request, until the coordinator is dropped.
async fn run_refreshes(inner: Weak<Inner>, mut requests: mpsc::Receiver<()>) {
    while requests.recv().await.is_some() {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let coordinator = ViewCoordinator { inner };
        let view = coordinator.active_view();
        if let Err(e) = coordinator.refresh_active().await {
            warn!("Refreshing {} failed: {}", view, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::{ChannelState, UpdateOrigin};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl ViewRefresh for Counting {
        async fn refresh(&self) -> ConsoleResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok(())
        }
    }

    fn update() -> RealtimeEvent {
        RealtimeEvent::Updated {
            collection: "sensors".to_string(),
            key: "k1".to_string(),
            origin: UpdateOrigin::Direct,
        }
    }

    async fn settle(coordinator: &ViewCoordinator, count: u64) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while coordinator.refresh_count() < count {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
    }

    #[tokio::test]
    async fn test_update_refreshes_active_view_once() {
        let dashboard = Arc::new(Counting::default());
        let analytics = Arc::new(Counting::default());
        let coordinator = ViewCoordinator::builder()
            .with_refresh(ActiveView::Dashboard, dashboard.clone())
            .with_refresh(ActiveView::Analytics, analytics.clone())
            .initial_view(ActiveView::Dashboard)
            .build();

        coordinator.handle_event(&update());
        settle(&coordinator, 1).await;

        assert_eq!(dashboard.calls.load(Ordering::SeqCst), 1);
        assert_eq!(analytics.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_data_and_none_views_ignore_changes() {
        let data = Arc::new(Counting::default());
        let coordinator = ViewCoordinator::builder()
            .with_refresh(ActiveView::Data, data.clone())
            .initial_view(ActiveView::Data)
            .build();

        coordinator.handle_event(&update());
        coordinator.set_active_view(ActiveView::None);
        coordinator.handle_event(&update());
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(data.calls.load(Ordering::SeqCst), 0);
        assert_eq!(coordinator.refresh_count(), 0);
    }

    #[tokio::test]
    async fn test_state_changes_do_not_refresh() {
        let dashboard = Arc::new(Counting::default());
        let coordinator = ViewCoordinator::builder()
            .with_refresh(ActiveView::Dashboard, dashboard.clone())
            .initial_view(ActiveView::Dashboard)
            .build();

        coordinator.handle_event(&RealtimeEvent::ConnectionStateChanged {
            state: ChannelState::Open,
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(dashboard.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_burst_is_coalesced() {
        let gate = Arc::new(Notify::new());
        let dashboard = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            gate: Some(gate.clone()),
        });
        let coordinator = ViewCoordinator::builder()
            .with_refresh(ActiveView::Dashboard, dashboard.clone())
            .initial_view(ActiveView::Dashboard)
            .build();

        coordinator.handle_event(&update());
        tokio::time::timeout(Duration::from_secs(2), async {
            while dashboard.calls.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .unwrap();

        // First refresh is in flight; these collapse into one more.
        for _ in 0..10 {
            coordinator.handle_event(&update());
        }
        gate.notify_one();
        tokio::time::timeout(Duration::from_secs(2), async {
            while dashboard.calls.load(Ordering::SeqCst) < 2 {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .unwrap();
        gate.notify_one();
        settle(&coordinator, 2).await;

        assert_eq!(dashboard.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_switch_view_loads_new_view() {
        let collections = Arc::new(Counting::default());
        let coordinator = ViewCoordinator::builder()
            .with_refresh(ActiveView::Collections, collections.clone())
            .build();
        assert_eq!(coordinator.active_view(), ActiveView::None);

        coordinator.switch_view(ActiveView::Collections);
        settle(&coordinator, 1).await;
        assert_eq!(collections.calls.load(Ordering::SeqCst), 1);

        coordinator.switch_view(ActiveView::Data);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(coordinator.refresh_count(), 1);
    }
}
