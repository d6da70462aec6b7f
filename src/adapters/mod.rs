//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`TungsteniteTransport`] - Real-time transport using tokio-tungstenite
//!
//! The [`mock`] submodule provides test doubles for all of them.

pub mod mock;
pub mod reqwest_http;
pub mod tungstenite_ws;

pub use mock::{MockHttpClient, MockTransport, RecordingNotifier};
pub use reqwest_http::ReqwestHttpClient;
pub use tungstenite_ws::TungsteniteTransport;
