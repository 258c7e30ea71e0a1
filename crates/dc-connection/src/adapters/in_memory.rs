//! # In-Memory Transport
//!
//! In-process [`ConsentTransport`] used by the test suites and local wiring.
//! Sessions are plain channels; the adapter records how many were opened and
//! how many are still live, and lets a test inject frames or simulate a
//! remote drop.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use shared_types::{MerchantId, CONSENT_UPDATE_EVENT};

use crate::ports::{CloseHandle, ConsentTransport, InboundFrame, TransportError, TransportSession};

#[derive(Default)]
struct State {
    opens: usize,
    next_session: u64,
    fail_next_open: bool,
    live: HashSet<u64>,
    opened_for: Vec<MerchantId>,
    /// Sender of the most recently opened live session.
    current: Option<(u64, mpsc::UnboundedSender<InboundFrame>)>,
}

/// In-process transport with injection and accounting hooks.
#[derive(Default, Clone)]
pub struct InMemoryTransport {
    state: Arc<Mutex<State>>,
}

impl InMemoryTransport {
    /// Create a fresh transport with no sessions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of sessions ever opened.
    #[must_use]
    pub fn opens(&self) -> usize {
        self.state.lock().expect("state lock poisoned").opens
    }

    /// Number of sessions currently open.
    #[must_use]
    pub fn live_sessions(&self) -> usize {
        self.state.lock().expect("state lock poisoned").live.len()
    }

    /// Merchants sessions were opened for, in order.
    #[must_use]
    pub fn opened_for(&self) -> Vec<MerchantId> {
        self.state
            .lock()
            .expect("state lock poisoned")
            .opened_for
            .clone()
    }

    /// Make the next `open()` fail with a connect error.
    pub fn fail_next_open(&self) {
        self.state.lock().expect("state lock poisoned").fail_next_open = true;
    }

    /// Inject a named event into the current session.
    ///
    /// Returns `false` when no session is live.
    pub fn push_event(&self, name: &str, data: serde_json::Value) -> bool {
        let state = self.state.lock().expect("state lock poisoned");
        match &state.current {
            Some((_, sender)) => sender
                .send(InboundFrame::Event {
                    name: name.to_string(),
                    data,
                })
                .is_ok(),
            None => false,
        }
    }

    /// Inject a `debt.consent.update` frame into the current session.
    pub fn push_consent(&self, debt_id: &str, action: &str) -> bool {
        self.push_event(
            CONSENT_UPDATE_EVENT,
            serde_json::json!({ "debtId": debt_id, "action": action }),
        )
    }

    /// Simulate a remote-side drop of the current session.
    pub fn drop_link(&self) {
        let mut state = self.state.lock().expect("state lock poisoned");
        if let Some((id, sender)) = state.current.take() {
            let _ = sender.send(InboundFrame::Closed);
            state.live.remove(&id);
            debug!(session = id, "in-memory link dropped");
        }
    }
}

#[async_trait]
impl ConsentTransport for InMemoryTransport {
    async fn open(&self, merchant_id: &MerchantId) -> Result<TransportSession, TransportError> {
        let (session_id, inbound) = {
            let mut state = self.state.lock().expect("state lock poisoned");
            if state.fail_next_open {
                state.fail_next_open = false;
                return Err(TransportError::Connect("simulated connect failure".into()));
            }

            let session_id = state.next_session;
            state.next_session += 1;
            state.opens += 1;
            state.opened_for.push(merchant_id.clone());

            let (tx, rx) = mpsc::unbounded_channel();
            state.current = Some((session_id, tx));
            state.live.insert(session_id);
            (session_id, rx)
        };

        // Watch for the manager closing (or dropping) its handle.
        let (close_tx, close_rx) = oneshot::channel::<()>();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let _ = close_rx.await;
            let mut state = state.lock().expect("state lock poisoned");
            state.live.remove(&session_id);
            if matches!(state.current, Some((id, _)) if id == session_id) {
                // Dropping the sender ends the session's inbound channel.
                state.current = None;
            }
            debug!(session = session_id, "in-memory session closed");
        });

        debug!(session = session_id, merchant = %merchant_id, "in-memory session opened");
        Ok(TransportSession {
            inbound,
            close: CloseHandle::new(close_tx),
        })
    }
}
