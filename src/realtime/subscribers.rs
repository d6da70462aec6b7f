//! Subscriber registry and fan-out.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{error, warn};

use super::event::RealtimeEvent;

/// Failure reported by a subscriber. Logged, never propagated.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct SubscriberError(pub String);

impl SubscriberError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Receives every event of a real-time channel.
///
/// Called on the channel's driver task, one event at a time, in arrival
/// order. Implementations should hand long work off rather than block.
pub trait RealtimeSubscriber: Send + Sync {
    fn on_event(&self, event: &RealtimeEvent) -> Result<(), SubscriberError>;
}

impl<F> RealtimeSubscriber for F
where
    F: Fn(&RealtimeEvent) + Send + Sync,
{
    fn on_event(&self, event: &RealtimeEvent) -> Result<(), SubscriberError> {
        self(event);
        Ok(())
    }
}

/// Handle for removing a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

type Entry = (SubscriptionId, Arc<dyn RealtimeSubscriber>);

#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    next_id: AtomicU64,
    entries: Mutex<Vec<Entry>>,
}

impl SubscriberRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, Vec<Entry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn add(&self, subscriber: Arc<dyn RealtimeSubscriber>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.entries().push((id, subscriber));
        id
    }

    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries().len()
    }

    /// Deliver `event` to every subscriber; returns how many accepted it.
    ///
    /// The list is copied first, so subscribers may (un)subscribe from
    /// inside `on_event`.
    pub(crate) fn dispatch(&self, event: &RealtimeEvent) -> usize {
        let snapshot: Vec<Entry> = self.entries().clone();
        let mut delivered = 0;
        for (id, subscriber) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| subscriber.on_event(event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => warn!("Subscriber {} failed on {:?}: {}", id, event, e),
                Err(_) => error!("Subscriber {} panicked on {:?}", id, event),
            }
        }
        delivered
    }
}
