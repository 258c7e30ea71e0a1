//! # Connection Manager
//!
//! Enforces the one-connection-per-merchant invariant and pumps inbound
//! frames into the typed handler registry.
//!
//! ## Lifecycle
//!
//! - [`ConnectionManager::connect`] is idempotent per merchant: a second
//!   call for the same merchant while a session is live is a no-op; a call
//!   for a *different* merchant tears the prior session down first, flagged
//!   intentional.
//! - [`ConnectionManager::disconnect`] closes the session and joins the pump
//!   task; it is flagged intentional so the manager's own teardown never
//!   re-enters the unintentional-disconnect path. Idempotent.
//! - Transport open failures are logged at debug level and are not surfaced
//!   to callers; consumers observe `is_connected()` or the `Connected`
//!   lifecycle event.
//!
//! ## Disconnect notification
//!
//! A transport-initiated drop dispatches
//! [`ConnectionEvent::Disconnected`] exactly once, then clears every
//! `Disconnected` registration (one-shot; re-arming requires
//! re-registering).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_types::{ConsentUpdate, MerchantId, CONSENT_UPDATE_EVENT};

use crate::events::{ConnectionEvent, EventKind};
use crate::ports::{CloseHandle, ConsentTransport, InboundFrame, TransportSession};
use crate::registry::HandlerRegistry;

/// The single live connection owned by the manager.
struct ActiveConnection {
    merchant_id: MerchantId,
    connection_id: Uuid,
    /// Cleared by the pump when the transport goes away.
    connected: Arc<AtomicBool>,
    /// Set before teardown so the pump exits silently.
    intentional: Arc<AtomicBool>,
    close: CloseHandle,
    pump: JoinHandle<()>,
}

/// Sync-readable mirror of the active connection, for `is_connected()`.
struct StatusEntry {
    merchant_id: MerchantId,
    connected: Arc<AtomicBool>,
}

/// Owns the logical socket connection and dispatches its events.
///
/// Construct one manager per runtime and share it via `Arc` — the
/// per-merchant idempotency invariant only holds across components holding
/// the same instance.
pub struct ConnectionManager {
    transport: Arc<dyn ConsentTransport>,
    registry: Arc<RwLock<HandlerRegistry>>,
    /// Serializes connect/disconnect; holds the live session.
    inner: Mutex<Option<ActiveConnection>>,
    status: RwLock<Option<StatusEntry>>,
}

impl ConnectionManager {
    /// Create a manager over the given transport.
    pub fn new(transport: Arc<dyn ConsentTransport>) -> Self {
        Self {
            transport,
            registry: Arc::new(RwLock::new(HandlerRegistry::default())),
            inner: Mutex::new(None),
            status: RwLock::new(None),
        }
    }

    /// Establish (or reuse) the connection for `merchant_id`.
    ///
    /// Idempotent for the currently connected merchant. For a different
    /// merchant the prior session is torn down first. Transport failures are
    /// logged and leave the manager disconnected; nothing is returned to the
    /// caller.
    pub async fn connect(&self, merchant_id: &MerchantId) {
        let mut inner = self.inner.lock().await;

        if let Some(active) = inner.as_ref() {
            if active.merchant_id == *merchant_id && active.connected.load(Ordering::SeqCst) {
                debug!(merchant = %merchant_id, "connect is a no-op: session already live");
                return;
            }
            // Different merchant, or a session the transport already lost.
            let prior = inner.take().expect("checked above");
            info!(
                prior = %prior.merchant_id,
                next = %merchant_id,
                "tearing down prior session before connecting"
            );
            self.teardown(prior).await;
        }

        let session = match self.transport.open(merchant_id).await {
            Ok(session) => session,
            Err(err) => {
                debug!(merchant = %merchant_id, error = %err, "transport open failed");
                return;
            }
        };

        let connection_id = Uuid::new_v4();
        let connected = Arc::new(AtomicBool::new(true));
        let intentional = Arc::new(AtomicBool::new(false));

        let pump = tokio::spawn(pump_frames(
            session.inbound,
            Arc::clone(&self.registry),
            Arc::clone(&connected),
            Arc::clone(&intentional),
            merchant_id.clone(),
            connection_id,
        ));

        *inner = Some(ActiveConnection {
            merchant_id: merchant_id.clone(),
            connection_id,
            connected: Arc::clone(&connected),
            intentional,
            close: session.close,
            pump,
        });
        *self.status.write().expect("status lock poisoned") = Some(StatusEntry {
            merchant_id: merchant_id.clone(),
            connected,
        });

        info!(merchant = %merchant_id, connection = %connection_id, "connected");
        self.dispatch(&ConnectionEvent::Connected {
            merchant_id: merchant_id.clone(),
        });
    }

    /// Close the connection if open. Idempotent.
    pub async fn disconnect(&self) {
        let mut inner = self.inner.lock().await;
        match inner.take() {
            Some(active) => {
                *self.status.write().expect("status lock poisoned") = None;
                info!(
                    merchant = %active.merchant_id,
                    connection = %active.connection_id,
                    "disconnecting"
                );
                self.teardown(active).await;
            }
            None => debug!("disconnect is a no-op: no live session"),
        }
    }

    /// Live transport state at call time.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status
            .read()
            .expect("status lock poisoned")
            .as_ref()
            .is_some_and(|entry| entry.connected.load(Ordering::SeqCst))
    }

    /// Merchant of the current session, if any.
    #[must_use]
    pub fn connected_merchant(&self) -> Option<MerchantId> {
        self.status
            .read()
            .expect("status lock poisoned")
            .as_ref()
            .map(|entry| entry.merchant_id.clone())
    }

    /// Register `sender` to receive events of `kind` under `handler_id`.
    ///
    /// Re-registering the same `(kind, handler_id)` replaces the previous
    /// registration; it never double-delivers.
    pub fn on(
        &self,
        kind: EventKind,
        handler_id: impl Into<String>,
        sender: mpsc::UnboundedSender<ConnectionEvent>,
    ) {
        self.registry
            .write()
            .expect("registry lock poisoned")
            .register(kind, handler_id.into(), sender);
    }

    /// Remove the registration for `(kind, handler_id)`. No-op when absent.
    pub fn off(&self, kind: EventKind, handler_id: &str) {
        self.registry
            .write()
            .expect("registry lock poisoned")
            .unregister(kind, handler_id);
    }

    fn dispatch(&self, event: &ConnectionEvent) {
        let delivered = self
            .registry
            .write()
            .expect("registry lock poisoned")
            .dispatch(event);
        debug!(kind = ?event.kind(), delivered, "event dispatched");
    }

    /// Close a session and wait for its pump to finish. The intentional flag
    /// is raised first so the pump exits without notifying anyone.
    async fn teardown(&self, mut active: ActiveConnection) {
        active.intentional.store(true, Ordering::SeqCst);
        active.close.close();
        if let Err(err) = active.pump.await {
            debug!(connection = %active.connection_id, error = %err, "pump task aborted");
        }
    }
}

/// Reads a session until it closes, routing frames into the registry.
async fn pump_frames(
    mut inbound: mpsc::UnboundedReceiver<InboundFrame>,
    registry: Arc<RwLock<HandlerRegistry>>,
    connected: Arc<AtomicBool>,
    intentional: Arc<AtomicBool>,
    merchant_id: MerchantId,
    connection_id: Uuid,
) {
    while let Some(frame) = inbound.recv().await {
        match frame {
            InboundFrame::Event { name, data } if name == CONSENT_UPDATE_EVENT => {
                match serde_json::from_value::<ConsentUpdate>(data) {
                    Ok(update) => {
                        let delivered = registry
                            .write()
                            .expect("registry lock poisoned")
                            .dispatch(&ConnectionEvent::ConsentUpdate(update));
                        if delivered == 0 {
                            debug!(connection = %connection_id, "consent update had no receiver");
                        }
                    }
                    Err(err) => {
                        debug!(connection = %connection_id, error = %err, "malformed consent payload dropped");
                    }
                }
            }
            InboundFrame::Event { name, .. } => {
                debug!(connection = %connection_id, event = %name, "unrouted event dropped");
            }
            InboundFrame::Closed => break,
        }
    }

    connected.store(false, Ordering::SeqCst);

    if !intentional.load(Ordering::SeqCst) {
        warn!(merchant = %merchant_id, connection = %connection_id, "transport dropped unintentionally");
        let mut registry = registry.write().expect("registry lock poisoned");
        registry.dispatch(&ConnectionEvent::Disconnected {
            merchant_id: merchant_id.clone(),
        });
        // One-shot: a second drop must not re-notify stale handlers.
        registry.clear(EventKind::Disconnected);
    }
}
