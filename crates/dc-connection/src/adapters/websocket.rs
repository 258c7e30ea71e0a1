//! # WebSocket Transport
//!
//! Production adapter over tokio-tungstenite. The connection is opened in
//! upgrade mode only (no polling fallback) with the merchant identity as a
//! query parameter:
//!
//! ```text
//! wss://consent.example.com/socket?merchantId=<id>
//! ```
//!
//! Text frames are JSON envelopes of the shape
//! `{ "event": "<name>", "data": { ... } }` and are forwarded into the
//! session channel as [`InboundFrame::Event`]; everything else (pings,
//! binary noise, unparseable text) is dropped at debug level.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;

use shared_types::MerchantId;

use crate::ports::{CloseHandle, ConsentTransport, InboundFrame, TransportError, TransportSession};

/// Settings for the WebSocket endpoint.
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Base `ws://` or `wss://` URL of the consent socket.
    pub endpoint: String,
}

impl WebSocketConfig {
    /// Configure from an endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Read the endpoint from `CONSENT_WS_ENDPOINT`, if set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var("CONSENT_WS_ENDPOINT").ok().map(Self::new)
    }

    /// Full connection URL for a merchant.
    #[must_use]
    pub fn url_for(&self, merchant_id: &MerchantId) -> String {
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{}merchantId={}", self.endpoint, separator, merchant_id)
    }
}

/// Wire envelope for a named server event.
#[derive(Debug, Deserialize)]
struct WireEnvelope {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// [`ConsentTransport`] over a persistent WebSocket.
pub struct WebSocketTransport {
    config: WebSocketConfig,
}

impl WebSocketTransport {
    /// Create a transport for the configured endpoint.
    #[must_use]
    pub fn new(config: WebSocketConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ConsentTransport for WebSocketTransport {
    async fn open(&self, merchant_id: &MerchantId) -> Result<TransportSession, TransportError> {
        let url = self.config.url_for(merchant_id);
        let (stream, _response) = tokio_tungstenite::connect_async(&url)
            .await
            .map_err(|err| TransportError::Connect(err.to_string()))?;
        debug!(merchant = %merchant_id, "websocket upgrade complete");

        let (mut sink, mut source) = stream.split();
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let (close_tx, mut close_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut close_rx => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                    message = source.next() => match message {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<WireEnvelope>(&text) {
                                Ok(envelope) => {
                                    let _ = frames_tx.send(InboundFrame::Event {
                                        name: envelope.event,
                                        data: envelope.data,
                                    });
                                }
                                Err(err) => debug!(error = %err, "unparseable text frame dropped"),
                            }
                        }
                        Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                        Some(Ok(Message::Binary(_) | Message::Frame(_))) => {
                            debug!("non-text frame dropped");
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                            let _ = frames_tx.send(InboundFrame::Closed);
                            break;
                        }
                    }
                }
            }
        });

        Ok(TransportSession {
            inbound: frames_rx,
            close: CloseHandle::new(close_tx),
        })
    }
}
