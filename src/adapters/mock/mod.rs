//! Mock implementations for testing.
//!
//! Test doubles for every seam in `crate::traits`, so the client can be
//! exercised without a network.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with configurable responses
//! - [`MockTransport`] - Real-time transport driven by a script
//! - [`RecordingNotifier`] - Notifier that keeps every notice

pub mod http;
pub mod notifier;
pub mod transport;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use notifier::RecordingNotifier;
pub use transport::{ConnectionHandle, MockTransport};
