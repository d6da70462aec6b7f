//! The real-time channel: one transport connection with automatic
//! reconnection and fan-out of parsed events.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::event::{parse_frame, RealtimeEvent};
use super::lifecycle::{ChannelState, CloseOutcome, ConnectionLifecycle};
use super::subscribers::{RealtimeSubscriber, SubscriberRegistry, SubscriptionId};
use crate::config::RealtimeConfig;
use crate::error::{ConsoleError, ConsoleResult};
use crate::notifications::Notice;
use crate::traits::{FrameStream, Notifier, RealtimeTransport};

/// Real-time channel to the AlphaBase `/ws` endpoint.
///
/// Cloning yields another handle to the same channel. The connection is
/// owned by a background driver task started by [`connect`]; when every
/// handle is dropped the driver closes the connection and exits.
///
/// ```text
/// Idle ──connect──▶ Connecting ──opened──▶ Open
///                      ▲   │                 │
///               delay  │   └─failed──▶ Closed ◀──closed/error
///                      └────retry────── │
///                                       └─retries used──▶ Exhausted
/// ```
///
/// [`connect`]: RealtimeChannel::connect
#[derive(Clone)]
pub struct RealtimeChannel {
    inner: Arc<Inner>,
}

struct Inner {
    url: String,
    config: RealtimeConfig,
    transport: Arc<dyn RealtimeTransport>,
    notifier: Arc<dyn Notifier>,
    lifecycle: Mutex<ConnectionLifecycle>,
    subscribers: SubscriberRegistry,
    state_tx: watch::Sender<ChannelState>,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
}

impl RealtimeChannel {
    /// Create an idle channel for `url`.
    pub fn new(
        url: impl Into<String>,
        config: RealtimeConfig,
        transport: Arc<dyn RealtimeTransport>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ChannelState::Idle);
        Self {
            inner: Arc::new(Inner {
                url: url.into(),
                lifecycle: Mutex::new(ConnectionLifecycle::new(config.max_reconnect_attempts)),
                config,
                transport,
                notifier,
                subscribers: SubscriberRegistry::new(),
                state_tx,
                shutdown: Mutex::new(None),
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.inner.config
    }

    /// Current state.
    pub fn state(&self) -> ChannelState {
        self.inner.lifecycle().state()
    }

    /// Watch state changes.
    pub fn state_receiver(&self) -> watch::Receiver<ChannelState> {
        self.inner.state_tx.subscribe()
    }

    /// Ok unless automatic reconnection has given up.
    pub fn ensure_available(&self) -> ConsoleResult<ChannelState> {
        let lifecycle = self.inner.lifecycle();
        match lifecycle.state() {
            ChannelState::Exhausted => Err(ConsoleError::ConnectionExhausted {
                attempts: lifecycle.attempts(),
            }),
            state => Ok(state),
        }
    }

    /// Start connecting.
    ///
    /// From `Idle` or `Exhausted` this starts a fresh lifecycle with the
    /// retry counter at zero and returns true. In any other state a
    /// lifecycle is already running and this does nothing.
    ///
    /// Must be called within a Tokio runtime.
    pub fn connect(&self) -> bool {
        let (generation, shutdown_rx) = {
            let mut lifecycle = self.inner.lifecycle();
            let Some(generation) = lifecycle.begin() else {
                debug!("connect() ignored in state {}", lifecycle.state());
                return false;
            };
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            if let Some(previous) = self.inner.shutdown_slot().replace(shutdown_tx) {
                let _ = previous.send(true);
            }
            self.inner.state_tx.send_replace(ChannelState::Connecting);
            (generation, shutdown_rx)
        };

        info!("Connecting to {}", self.inner.url);
        tokio::spawn(drive(Arc::downgrade(&self.inner), generation, shutdown_rx));
        true
    }

    /// Close the connection and cancel any pending retry.
    ///
    /// Valid in every state; the channel ends `Idle`. Subscribers stay
    /// registered.
    pub fn disconnect(&self) {
        let previous = {
            let mut lifecycle = self.inner.lifecycle();
            let previous = lifecycle.state();
            lifecycle.reset();
            if let Some(shutdown) = self.inner.shutdown_slot().take() {
                let _ = shutdown.send(true);
            }
            self.inner.state_tx.send_replace(ChannelState::Idle);
            previous
        };

        if previous != ChannelState::Idle {
            info!("Disconnected from {} (was {})", self.inner.url, previous);
            self.inner
                .subscribers
                .dispatch(&RealtimeEvent::ConnectionStateChanged {
                    state: ChannelState::Idle,
                });
        }
    }

    /// Register a subscriber for every future event.
    pub fn subscribe(&self, subscriber: Arc<dyn RealtimeSubscriber>) -> SubscriptionId {
        self.inner.subscribers.add(subscriber)
    }

    /// Remove a subscriber. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.remove(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

impl std::fmt::Debug for RealtimeChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeChannel")
            .field("url", &self.inner.url)
            .field("state", &self.state())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl Inner {
    fn lifecycle(&self) -> MutexGuard<'_, ConnectionLifecycle> {
        self.lifecycle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn shutdown_slot(&self) -> MutexGuard<'_, Option<watch::Sender<bool>>> {
        self.shutdown
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply a transition and publish the resulting state under the lock.
    fn transition<T>(
        &self,
        apply: impl FnOnce(&mut ConnectionLifecycle) -> Option<T>,
    ) -> Option<(T, ChannelState)> {
        let mut lifecycle = self.lifecycle();
        let result = apply(&mut lifecycle)?;
        let state = lifecycle.state();
        self.state_tx.send_replace(state);
        Some((result, state))
    }

    /// Dispatch a state change unless `generation` was torn down meanwhile.
    ///
    /// Subscribers run outside the lifecycle lock and may call
    /// `disconnect()`, so the check is repeated before every emission.
    fn announce(&self, generation: u64, state: ChannelState) -> bool {
        if !self.lifecycle().is_current(generation) {
            debug!("Dropping stale {} announcement", state);
            return false;
        }
        self.subscribers
            .dispatch(&RealtimeEvent::ConnectionStateChanged { state });
        true
    }

    fn notify(&self, generation: u64, notice: Notice) {
        if self.lifecycle().is_current(generation) {
            self.notifier.notify(notice);
        }
    }

    fn on_opened(&self, generation: u64) -> bool {
        if self
            .transition(|l| l.opened(generation).then_some(()))
            .is_none()
        {
            return false;
        }
        info!("Real-time channel open: {}", self.url);
        if !self.announce(generation, ChannelState::Open) {
            return false;
        }
        self.notify(generation, Notice::connected());
        self.lifecycle().is_current(generation)
    }

    fn on_closed(&self, generation: u64) -> Option<CloseOutcome> {
        let (outcome, _) = self.transition(|l| l.closed(generation))?;
        if !self.announce(generation, ChannelState::Closed) {
            return None;
        }
        match outcome {
            CloseOutcome::Retry { attempt } => {
                info!(
                    "Reconnecting in {:?} (attempt {}/{})",
                    self.config.reconnect_delay, attempt, self.config.max_reconnect_attempts
                );
            }
            CloseOutcome::Exhausted { attempts } => {
                error!(
                    "Real-time channel gave up after {} reconnect attempts",
                    attempts
                );
                if self.announce(generation, ChannelState::Exhausted) {
                    self.notify(generation, Notice::connection_lost());
                }
            }
        }
        Some(outcome)
    }

    fn on_retry(&self, generation: u64) -> bool {
        self.transition(|l| l.retry(generation).then_some(()))
            .is_some()
    }

    fn on_frame(&self, generation: u64, text: &str) -> bool {
        if !self.lifecycle().is_current(generation) {
            return false;
        }
        match parse_frame(text) {
            Ok(Some(event)) => {
                debug!("Real-time event: {:?}", event);
                self.subscribers.dispatch(&event);
            }
            Ok(None) => debug!("Ignoring frame: {}", text),
            Err(e) => warn!("Dropping malformed frame: {} - {}", e, text),
        }
        true
    }
}

enum PumpEnd {
    Closed,
    Shutdown,
}

/// Driver task for one lifecycle generation.
async fn drive(inner: Weak<Inner>, generation: u64, mut shutdown: watch::Receiver<bool>) {
    loop {
        let (transport, url) = match inner.upgrade() {
            Some(inner) => (inner.transport.clone(), inner.url.clone()),
            None => return,
        };

        let connected = tokio::select! {
            _ = wait_for_shutdown(&mut shutdown) => return,
            result = transport.connect(&url) => result,
        };

        match connected {
            Ok(mut stream) => {
                let opened = inner
                    .upgrade()
                    .map_or(false, |inner| inner.on_opened(generation));
                if !opened {
                    stream.close().await;
                    return;
                }
                match pump(&inner, generation, stream.as_mut(), &mut shutdown).await {
                    PumpEnd::Shutdown => {
                        stream.close().await;
                        return;
                    }
                    PumpEnd::Closed => info!("Real-time connection closed"),
                }
            }
            Err(e) => warn!("Real-time connection failed: {}", e),
        }

        let delay = {
            let Some(inner) = inner.upgrade() else {
                return;
            };
            match inner.on_closed(generation) {
                Some(CloseOutcome::Retry { .. }) => inner.config.reconnect_delay,
                Some(CloseOutcome::Exhausted { .. }) | None => return,
            }
        };

        tokio::select! {
            _ = wait_for_shutdown(&mut shutdown) => return,
            _ = tokio::time::sleep(delay) => {}
        }

        let retrying = inner
            .upgrade()
            .map_or(false, |inner| inner.on_retry(generation));
        if !retrying {
            return;
        }
    }
}

async fn pump(
    inner: &Weak<Inner>,
    generation: u64,
    stream: &mut dyn FrameStream,
    shutdown: &mut watch::Receiver<bool>,
) -> PumpEnd {
    loop {
        tokio::select! {
            _ = wait_for_shutdown(shutdown) => return PumpEnd::Shutdown,
            frame = stream.next_frame() => match frame {
                Some(Ok(text)) => {
                    let current = inner
                        .upgrade()
                        .map_or(false, |inner| inner.on_frame(generation, &text));
                    if !current {
                        return PumpEnd::Shutdown;
                    }
                }
                Some(Err(e)) => {
                    warn!("Real-time transport error: {}", e);
                    return PumpEnd::Closed;
                }
                None => return PumpEnd::Closed,
            },
        }
    }
}

/// Resolves once shutdown is signalled or the channel is gone.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
