//! Tungstenite-based real-time transport.
//!
//! Opens the AlphaBase `/ws` endpoint with tokio-tungstenite and exposes it
//! as a [`FrameStream`] of text frames. Pings are answered here; close
//! frames end the stream.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::traits::{FrameStream, RealtimeTransport, TransportError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport using tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteTransport;

impl TungsteniteTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RealtimeTransport for TungsteniteTransport {
    async fn connect(&self, url: &str) -> Result<Box<dyn FrameStream>, TransportError> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        info!("Connected to WebSocket server at {}", url);
        Ok(Box::new(TungsteniteFrameStream { ws, closed: false }))
    }
}

struct TungsteniteFrameStream {
    ws: WsStream,
    closed: bool,
}

#[async_trait]
impl FrameStream for TungsteniteFrameStream {
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>> {
        if self.closed {
            return None;
        }
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text)),
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                    Ok(text) => return Some(Ok(text)),
                    Err(e) => warn!("Dropping non-UTF-8 binary frame: {}", e),
                },
                Some(Ok(Message::Ping(data))) => {
                    debug!("Received ping, sending pong");
                    if let Err(e) = self.ws.send(Message::Pong(data)).await {
                        return Some(Err(TransportError::Io(e.to_string())));
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    info!("Received close frame from server: {:?}", frame);
                    self.closed = true;
                    return None;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    self.closed = true;
                    return Some(Err(TransportError::Io(e.to_string())));
                }
                None => {
                    self.closed = true;
                    return None;
                }
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.ws.close(None).await {
            debug!("WebSocket close failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_refused() {
        let transport = TungsteniteTransport::new();
        let result = transport.connect("ws://127.0.0.1:59998/ws").await;
        assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_connect_invalid_url() {
        let transport = TungsteniteTransport::new();
        assert!(transport.connect("not a url").await.is_err());
    }
}
