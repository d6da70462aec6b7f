//! Scripted real-time transport for testing.
//!
//! Each call to [`RealtimeTransport::connect`] consumes the next scripted
//! outcome. An open connection is fed through the [`ConnectionHandle`]
//! returned when it was scripted; dropping the handle closes the connection
//! from the server side.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::traits::{FrameStream, RealtimeTransport, TransportError};

type FrameResult = Result<String, TransportError>;

enum Scripted {
    Open(mpsc::UnboundedReceiver<FrameResult>),
    Fail(String),
}

/// Server side of one scripted connection.
#[derive(Debug)]
pub struct ConnectionHandle {
    tx: mpsc::UnboundedSender<FrameResult>,
}

impl ConnectionHandle {
    /// Push a text frame. Returns false once the client side is gone.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.tx.send(Ok(text.into())).is_ok()
    }

    /// Fail the connection with a transport error.
    pub fn send_error(&self, message: impl Into<String>) -> bool {
        self.tx
            .send(Err(TransportError::Io(message.into())))
            .is_ok()
    }

    /// Close the connection from the server side.
    pub fn close(self) {}
}

/// Scripted implementation of [`RealtimeTransport`].
///
/// Connect attempts beyond the script fail.
///
/// # Example
///
/// ```ignore
/// let transport = MockTransport::new();
/// let server = transport.script_open();
/// transport.script_failure("refused");
///
/// channel.connect();
/// server.send_text(r#"{"action":"update","collection":"sensors","key":"k1"}"#);
/// server.close(); // triggers a reconnect, which then fails
/// ```
#[derive(Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    attempts: Arc<Mutex<Vec<(String, Instant)>>>,
    client_closes: Arc<AtomicUsize>,
}

impl MockTransport {
    /// Create a transport with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a connection that opens; returns its server side.
    pub fn script_open(&self) -> ConnectionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        self.script.lock().unwrap().push_back(Scripted::Open(rx));
        ConnectionHandle { tx }
    }

    /// Script a connection that fails to open.
    pub fn script_failure(&self, message: impl Into<String>) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Fail(message.into()));
    }

    /// Number of connect attempts so far.
    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    /// When each connect attempt happened.
    pub fn attempt_times(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }

    /// URLs of all connect attempts.
    pub fn attempted_urls(&self) -> Vec<String> {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .map(|(u, _)| u.clone())
            .collect()
    }

    /// Connections the client closed itself.
    pub fn client_closes(&self) -> usize {
        self.client_closes.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` connect attempts were made.
    ///
    /// Returns false if `timeout` passes first.
    pub async fn wait_for_attempts(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.attempt_count() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        self.attempt_count() >= count
    }
}

#[async_trait]
impl RealtimeTransport for MockTransport {
    async fn connect(&self, url: &str) -> Result<Box<dyn FrameStream>, TransportError> {
        self.attempts
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Open(rx)) => Ok(Box::new(MockFrameStream {
                rx,
                closed: false,
                client_closes: self.client_closes.clone(),
            })),
            Some(Scripted::Fail(message)) => Err(TransportError::ConnectionFailed(message)),
            None => Err(TransportError::ConnectionFailed(
                "no scripted connection".to_string(),
            )),
        }
    }
}

struct MockFrameStream {
    rx: mpsc::UnboundedReceiver<FrameResult>,
    closed: bool,
    client_closes: Arc<AtomicUsize>,
}

#[async_trait]
impl FrameStream for MockFrameStream {
    async fn next_frame(&mut self) -> Option<FrameResult> {
        if self.closed {
            return None;
        }
        self.rx.recv().await
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.rx.close();
            self.client_closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}
