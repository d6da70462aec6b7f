//! User-facing notices.
//!
//! Notices are short title/message pairs surfaced by a [`Notifier`]: data
//! changes pushed by the server, connection status, sign-in, and failures of
//! direct user actions.

use std::sync::Arc;
use std::time::Duration;

use crate::error::ConsoleError;
use crate::realtime::{RealtimeEvent, RealtimeSubscriber, SubscriberError, UpdateOrigin};
use crate::traits::Notifier;

/// How long a notice stays up unless it says otherwise.
pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_millis(5000);

/// Display time of data-change notices.
pub const SHORT_NOTICE_DURATION: Duration = Duration::from_millis(3000);

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        }
    }
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub level: NoticeLevel,
    pub duration: Duration,
}

impl Notice {
    /// Create a notice shown for the default duration.
    pub fn new(title: impl Into<String>, message: impl Into<String>, level: NoticeLevel) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            level,
            duration: DEFAULT_NOTICE_DURATION,
        }
    }

    /// Override the display duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// The real-time channel opened.
    pub fn connected() -> Self {
        Self::new(
            "Real-time Connected",
            "Connected to live updates",
            NoticeLevel::Success,
        )
    }

    /// The real-time channel gave up reconnecting.
    pub fn connection_lost() -> Self {
        Self::new(
            "Connection Lost",
            "Real-time updates disconnected. Reconnect to resume live updates.",
            NoticeLevel::Error,
        )
    }

    /// Sign-in succeeded.
    pub fn welcome(username: &str) -> Self {
        Self::new("Welcome!", format!("Signed in as {}", username), NoticeLevel::Success)
            .with_duration(SHORT_NOTICE_DURATION)
    }

    /// An item was saved by the user.
    pub fn item_saved(collection: &str, key: &str) -> Self {
        Self::new(
            "Saved",
            format!("{}/{} saved", collection, key),
            NoticeLevel::Success,
        )
        .with_duration(SHORT_NOTICE_DURATION)
    }

    /// An item was deleted by the user.
    pub fn item_deleted(collection: &str, key: &str) -> Self {
        Self::new(
            "Deleted",
            format!("{}/{} deleted", collection, key),
            NoticeLevel::Success,
        )
        .with_duration(SHORT_NOTICE_DURATION)
    }

    /// A direct user action failed.
    pub fn operation_failed(operation: &str, error: &ConsoleError) -> Self {
        Self::new(
            format!("{} failed", operation),
            error.user_message(),
            NoticeLevel::Error,
        )
    }

    /// Notice for a server-pushed data change, if the event is one.
    pub fn for_event(event: &RealtimeEvent) -> Option<Self> {
        match event {
            RealtimeEvent::Updated {
                collection,
                key,
                origin,
            } => {
                let verb = match origin {
                    UpdateOrigin::Mqtt => "updated via MQTT",
                    _ => "updated",
                };
                Some(
                    Self::new(
                        "Data Updated",
                        format!("{}/{} was {}", collection, key, verb),
                        NoticeLevel::Info,
                    )
                    .with_duration(SHORT_NOTICE_DURATION),
                )
            }
            RealtimeEvent::Deleted { collection, key } => Some(
                Self::new(
                    "Data Deleted",
                    format!("{}/{} was deleted", collection, key),
                    NoticeLevel::Warning,
                )
                .with_duration(SHORT_NOTICE_DURATION),
            ),
            RealtimeEvent::ConnectionStateChanged { .. } => None,
        }
    }
}

/// Turns data-change events into notices.
pub struct NoticeSubscriber {
    notifier: Arc<dyn Notifier>,
}

impl NoticeSubscriber {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

impl RealtimeSubscriber for NoticeSubscriber {
    fn on_event(&self, event: &RealtimeEvent) -> Result<(), SubscriberError> {
        if let Some(notice) = Notice::for_event(event) {
            self.notifier.notify(notice);
        }
        Ok(())
    }
}

/// Writes notices to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => tracing::error!("{}: {}", notice.title, notice.message),
            NoticeLevel::Warning => tracing::warn!("{}: {}", notice.title, notice.message),
            NoticeLevel::Success | NoticeLevel::Info => {
                tracing::info!("{}: {}", notice.title, notice.message)
            }
        }
    }
}
