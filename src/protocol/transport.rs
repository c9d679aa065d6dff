//! Connection transport
//!
//! [`Transport`] abstracts the persistent text connection so the session can be
//! driven by a WebSocket in production and by scripted fakes in tests.

use crate::types::ProtocolError;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

/// Bidirectional text message channel
#[async_trait]
pub trait Transport: Send {
    /// Send one text message
    async fn send(&mut self, message: String) -> Result<(), ProtocolError>;

    /// Receive the next text message, skipping control frames
    async fn recv(&mut self) -> Result<String, ProtocolError>;

    /// Close the connection; closing an already closed connection succeeds
    async fn close(&mut self) -> Result<(), ProtocolError>;
}

/// WebSocket transport over TCP or TLS
pub struct WebSocketTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocketTransport {
    /// Open a WebSocket connection to `url` (`ws://` or `wss://`)
    pub async fn connect(url: &str) -> Result<Self, ProtocolError> {
        debug!(url, "opening websocket");
        let (stream, response) = connect_async(url).await?;
        debug!(status = %response.status(), "websocket opened");
        Ok(Self { stream })
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, message: String) -> Result<(), ProtocolError> {
        trace!(%message, "ws send");
        self.stream.send(Message::Text(message.into())).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<String, ProtocolError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    trace!(message = %text, "ws recv");
                    return Ok(text.to_string());
                }
                Some(Ok(Message::Binary(bytes))) => {
                    return Ok(String::from_utf8_lossy(&bytes).into_owned());
                }
                Some(Ok(Message::Close(_))) | None => return Err(ProtocolError::ConnectionClosed),
                // Ping/pong are answered by tungstenite itself
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    async fn close(&mut self) -> Result<(), ProtocolError> {
        match self.stream.close(None).await {
            Ok(()) => Ok(()),
            Err(e) => match ProtocolError::from(e) {
                ProtocolError::ConnectionClosed => Ok(()),
                other => Err(other),
            },
        }
    }
}
