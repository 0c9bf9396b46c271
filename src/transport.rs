//! Push channel transport.
//!
//! ARCHITECTURE
//! ============
//! [`Channel`] is the seam between the session binding and the wire: the
//! binding consumes one stream of [`Inbound`] events and pushes [`Outbound`]
//! notifications, with no knowledge of sockets. [`WsChannel`] is the real
//! implementation; tests substitute an in-memory channel.
//!
//! [`WsChannel`] owns the whole connection lifecycle: connect, reconnect
//! with exponential backoff, and wire decode. The binding never retries
//! anything; it only reflects the `Connected`/`Disconnected` items this
//! layer yields. Malformed wire payloads are dropped here with a warn log
//! and never reach the reducers.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::warn;

use crate::event::{self, Inbound, Outbound};

const INITIAL_BACKOFF_MS: u64 = 1_000;
const MAX_BACKOFF_MS: u64 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid push endpoint URL: {0}")]
    InvalidUrl(String),
    #[error("websocket send failed: {0}")]
    Send(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("not connected")]
    NotConnected,
    #[error(transparent)]
    Codec(#[from] event::EventError),
}

/// One logical push channel. `recv` returning `None` means the channel is
/// finished for good (closed locally); transient drops surface as
/// `Inbound::Disconnected` followed by a later `Inbound::Connected`.
#[async_trait]
pub trait Channel: Send {
    /// Fire-and-forget outbound notification. Failing is not fatal to the
    /// session; callers log and move on.
    async fn send(&mut self, event: &Outbound) -> Result<(), TransportError>;

    /// Next inbound event, or `None` once the channel is closed.
    async fn recv(&mut self) -> Option<Inbound>;

    /// Close the underlying connection. Idempotent.
    async fn close(&mut self);
}

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// WebSocket push channel backed by tokio-tungstenite.
pub struct WsChannel {
    url: String,
    stream: Option<WsStream>,
    backoff_ms: u64,
    closed: bool,
}

impl WsChannel {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), stream: None, backoff_ms: 0, closed: false }
    }

    /// Map the configured HTTP base URL of the push server onto its
    /// WebSocket endpoint.
    pub fn endpoint(base_url: &str) -> Result<String, TransportError> {
        let trimmed = base_url.trim_end_matches('/');
        if let Some(rest) = trimmed.strip_prefix("http://") {
            return Ok(format!("ws://{rest}/live"));
        }
        if let Some(rest) = trimmed.strip_prefix("https://") {
            return Ok(format!("wss://{rest}/live"));
        }
        Err(TransportError::InvalidUrl(base_url.to_owned()))
    }

    async fn connect(&mut self) -> Option<Inbound> {
        if self.backoff_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.backoff_ms)).await;
        }
        match connect_async(self.url.as_str()).await {
            Ok((stream, _)) => {
                self.stream = Some(stream);
                self.backoff_ms = INITIAL_BACKOFF_MS;
                Some(Inbound::Connected)
            }
            Err(e) => {
                warn!(error = %e, url = %self.url, "push connect failed");
                self.backoff_ms = if self.backoff_ms == 0 {
                    INITIAL_BACKOFF_MS
                } else {
                    (self.backoff_ms * 2).min(MAX_BACKOFF_MS)
                };
                None
            }
        }
    }
}

#[async_trait]
impl Channel for WsChannel {
    async fn send(&mut self, event: &Outbound) -> Result<(), TransportError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(TransportError::NotConnected);
        };
        let json = event::encode_outbound(event)?;
        stream
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| TransportError::Send(Box::new(e)))
    }

    async fn recv(&mut self) -> Option<Inbound> {
        loop {
            if self.closed {
                return None;
            }

            if self.stream.is_none() {
                match self.connect().await {
                    Some(event) => return Some(event),
                    None => continue,
                }
            }
            let Some(stream) = self.stream.as_mut() else {
                continue;
            };

            match stream.next().await {
                Some(Ok(Message::Text(text))) => match event::decode_inbound(&text) {
                    Ok(event) => return Some(event),
                    Err(e) => {
                        warn!(error = %e, "dropping malformed push event");
                    }
                },
                Some(Ok(Message::Close(_))) | None => {
                    self.stream = None;
                    return Some(Inbound::Disconnected);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "push channel read failed");
                    self.stream = None;
                    return Some(Inbound::Disconnected);
                }
            }
        }
    }

    async fn close(&mut self) {
        self.closed = true;
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.close(None).await;
        }
    }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
