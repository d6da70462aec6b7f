//! Real-time transport trait abstraction.
//!
//! The channel state machine only needs two things from a WebSocket: open a
//! connection to a URL, then read text frames until the connection ends.
//! Keeping that behind a trait lets the lifecycle be driven by scripted
//! transports in tests.

use async_trait::async_trait;
use thiserror::Error;

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection could not be established
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// An open connection failed
    #[error("Transport error: {0}")]
    Io(String),
    /// The peer violated the WebSocket protocol
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// One open connection, read frame by frame.
#[async_trait]
pub trait FrameStream: Send {
    /// Wait for the next text frame.
    ///
    /// Returns `None` once the connection is closed (close frame or end of
    /// stream) and `Some(Err(_))` when it errored. Control frames are handled
    /// by the implementation and never surfaced.
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>>;

    /// Close the connection gracefully.
    async fn close(&mut self);
}

/// Opens connections to the real-time endpoint.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Open a connection to `url`.
    async fn connect(&self, url: &str) -> Result<Box<dyn FrameStream>, TransportError>;
}
