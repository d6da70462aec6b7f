//! Real-time synchronization over the AlphaBase WebSocket.
//!
//! - [`RealtimeChannel`] owns the connection and its reconnect policy
//! - [`ConnectionLifecycle`] is the state machine behind it
//! - [`parse_frame`] turns server frames into [`RealtimeEvent`]s
//! - [`RealtimeSubscriber`] receives them

pub mod channel;
pub mod event;
pub mod lifecycle;
pub mod subscribers;

pub use channel::RealtimeChannel;
pub use event::{parse_frame, FrameError, RealtimeEvent, UpdateOrigin};
pub use lifecycle::{ChannelState, CloseOutcome, ConnectionLifecycle};
pub use subscribers::{RealtimeSubscriber, SubscriberError, SubscriptionId};
