//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP client operations (GET, POST, DELETE, multipart)
//! - [`RealtimeTransport`] / [`FrameStream`] - WebSocket connections
//! - [`Notifier`] - User-visible notices
//! - [`ViewRefresh`] / [`SnapshotRenderer`] - View reload and rendering

pub mod http;
pub mod notifier;
pub mod view;
pub mod websocket;

pub use http::{FilePart, Headers, HttpClient, HttpError, MultipartForm, Response};
pub use notifier::Notifier;
pub use view::{SnapshotRenderer, ViewRefresh};
pub use websocket::{FrameStream, RealtimeTransport, TransportError};
