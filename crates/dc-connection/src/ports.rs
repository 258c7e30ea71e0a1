//! # Transport Port
//!
//! Trait boundary between the connection manager and the physical
//! connection. Adapters (in-memory, WebSocket) implement [`ConsentTransport`];
//! the manager owns the returned [`TransportSession`] exclusively and is the
//! only component that may close it.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use shared_types::MerchantId;

/// Errors raised while opening a transport session.
///
/// These never cross the manager's public boundary; the manager logs them
/// and leaves the connection down for consumers to observe via
/// `is_connected()`.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint could not be reached.
    #[error("failed to reach consent endpoint: {0}")]
    Connect(String),

    /// The connection was established but the upgrade/handshake failed.
    #[error("connection handshake failed: {0}")]
    Handshake(String),
}

/// A frame surfaced by a live transport session.
#[derive(Debug)]
pub enum InboundFrame {
    /// A named server event with its JSON payload.
    Event {
        /// Wire event name (e.g. `debt.consent.update`).
        name: String,
        /// Raw JSON payload; parsed by the manager per event name.
        data: serde_json::Value,
    },
    /// The session ended on the transport side (remote close or error).
    Closed,
}

/// One-shot trigger that closes the owning session.
///
/// Dropping the handle closes the session as well, so a session can never
/// outlive the manager state that owns it.
#[derive(Debug)]
pub struct CloseHandle(Option<oneshot::Sender<()>>);

impl CloseHandle {
    /// Wrap the close trigger of a session.
    #[must_use]
    pub fn new(trigger: oneshot::Sender<()>) -> Self {
        Self(Some(trigger))
    }

    /// Close the session. Idempotent.
    pub fn close(&mut self) {
        if let Some(trigger) = self.0.take() {
            let _ = trigger.send(());
        }
    }
}

impl Drop for CloseHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// A live transport session handed to the connection manager.
pub struct TransportSession {
    /// Inbound frames, ending with [`InboundFrame::Closed`] or channel end.
    pub inbound: mpsc::UnboundedReceiver<InboundFrame>,
    /// Closes the session when triggered or dropped.
    pub close: CloseHandle,
}

/// Opens transport sessions scoped to a merchant identity.
///
/// The merchant id is carried as a connection parameter (query string for
/// the WebSocket adapter), authenticating the logical channel.
#[async_trait]
pub trait ConsentTransport: Send + Sync {
    /// Open a session for the given merchant.
    async fn open(&self, merchant_id: &MerchantId) -> Result<TransportSession, TransportError>;
}
