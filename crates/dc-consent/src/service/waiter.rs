//! # Consent Waiter
//!
//! Drives the `Idle → Waiting → terminal` lifecycle for one debt at a time.
//!
//! ## Resolution paths
//!
//! The wait task serializes every signal through a single `select!` loop:
//! the first of a correlated accept/reject/expire event, an unintentional
//! disconnect (resolved as `Expired`), the timeout fire (resolved as
//! `Expired`) or a `cancel()` call wins, and the loop exits. Teardown is one
//! code path for every exit: the timer dies with the task, both handler
//! registrations are removed, and the connection is released.
//!
//! ## Exactly-once delivery
//!
//! The outcome callback is an `FnOnce` consumed by the resolution step, and
//! an explicit one-shot guard protects the terminal transition — a late
//! timer fire or duplicate event can never re-deliver. Cancellation is
//! caller-acknowledged: it performs the same teardown but never invokes the
//! outcome callback.
//!
//! ## Concurrency assumptions
//!
//! One wait at a time, started and cancelled from one logical caller (the
//! dashboard flow). `start_waiting` while `Waiting` is rejected rather than
//! replacing the in-flight wait — silent replacement risks delivering a
//! stale outcome to the wrong caller.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use dc_connection::{ConnectionEvent, ConnectionManager, EventKind};
use shared_types::{ConsentOutcome, ConsentStatus, DebtId, MerchantId};

use crate::domain::{correlate, PendingConsent};
use crate::service::config::WaiterConfig;

/// Handler id prefix under which the waiter registers with the manager.
/// Scoped by wait generation so a finishing wait can only unregister its
/// own handlers.
const HANDLER_PREFIX: &str = "consent-waiter";

/// Errors crossing the waiter's public boundary.
///
/// Asynchronous failures (transport loss, timeout) never appear here; they
/// are delivered through the outcome callback as `Expired`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaiterError {
    /// `start_waiting` was called while a wait is in flight. The in-flight
    /// debt id is preserved, never overwritten.
    #[error("already waiting for consent on debt {0}")]
    AlreadyWaiting(DebtId),

    /// `cancel` was called with no wait in flight.
    #[error("no consent wait in progress")]
    NotWaiting,
}

/// Observational snapshot of the waiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaiterStatus {
    /// No debt is being awaited.
    Idle,
    /// A decision is being awaited.
    Waiting {
        /// The debt under observation.
        debt_id: DebtId,
        /// Seconds since the wait began, per the presentational tick.
        elapsed_secs: u64,
    },
}

/// The debt-consent waiter state machine.
///
/// Cheap to clone; clones share the same state. The connection manager is
/// injected explicitly — per-merchant connection idempotency holds across
/// every component holding the same manager instance.
#[derive(Clone)]
pub struct ConsentWaiter {
    manager: Arc<ConnectionManager>,
    config: WaiterConfig,
    inner: Arc<Mutex<WaiterInner>>,
}

#[derive(Default)]
struct WaiterInner {
    next_generation: u64,
    session: Option<ActiveWait>,
}

struct ActiveWait {
    generation: u64,
    debt_id: DebtId,
    elapsed_secs: Arc<AtomicU64>,
    cancel: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ConsentWaiter {
    /// Create a waiter over a shared connection manager.
    #[must_use]
    pub fn new(manager: Arc<ConnectionManager>, config: WaiterConfig) -> Self {
        Self {
            manager,
            config,
            inner: Arc::new(Mutex::new(WaiterInner::default())),
        }
    }

    /// Begin waiting for the customer decision on `debt_id`.
    ///
    /// Registers for consent and disconnect events, requests the merchant's
    /// connection, arms the timeout and the elapsed-seconds tick.
    /// `on_outcome` fires exactly once with `Accepted`, `Rejected` or
    /// `Expired`; it does not fire for a cancelled wait.
    ///
    /// # Errors
    /// [`WaiterError::AlreadyWaiting`] when a wait is already in flight.
    pub async fn start_waiting(
        &self,
        debt_id: DebtId,
        merchant_id: MerchantId,
        on_outcome: impl FnOnce(ConsentOutcome) + Send + 'static,
    ) -> Result<(), WaiterError> {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let elapsed_secs = Arc::new(AtomicU64::new(0));

        // Reserve the Waiting slot before any await so a concurrent start
        // cannot slip in between check and commit.
        let generation = {
            let mut inner = self.inner.lock().expect("waiter lock poisoned");
            if let Some(active) = inner.session.as_ref() {
                return Err(WaiterError::AlreadyWaiting(active.debt_id.clone()));
            }
            let generation = inner.next_generation;
            inner.next_generation += 1;
            inner.session = Some(ActiveWait {
                generation,
                debt_id: debt_id.clone(),
                elapsed_secs: Arc::clone(&elapsed_secs),
                cancel: Some(cancel_tx),
                task: None,
            });
            generation
        };

        let handler_id = handler_id(generation);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        self.manager
            .on(EventKind::ConsentUpdate, handler_id.clone(), events_tx.clone());
        self.manager
            .on(EventKind::Disconnected, handler_id.clone(), events_tx);
        self.manager.connect(&merchant_id).await;

        info!(debt = %debt_id, merchant = %merchant_id, "waiting for consent");

        let task = WaitTask {
            manager: Arc::clone(&self.manager),
            inner: Arc::clone(&self.inner),
            config: self.config.clone(),
            pending: PendingConsent::new(debt_id, merchant_id),
            generation,
            handler_id,
            elapsed_secs,
            resolved: AtomicBool::new(false),
            events: events_rx,
            cancel: cancel_rx,
            callback: Box::new(on_outcome),
        };
        let handle = tokio::spawn(task.run());

        let mut inner = self.inner.lock().expect("waiter lock poisoned");
        if let Some(active) = inner.session.as_mut() {
            if active.generation == generation {
                active.task = Some(handle);
            }
        }
        Ok(())
    }

    /// Abandon the in-flight wait (e.g. "go back" in the UI).
    ///
    /// Performs the full teardown (handlers unregistered, connection
    /// released, timer cleared) and returns once it is complete. The
    /// outcome callback is **not** invoked.
    ///
    /// The single-logical-caller assumption covers this method: a
    /// `start_waiting` racing a `cancel` from another task could see its
    /// fresh connection released by the cancelled wait's teardown. Start
    /// the next wait after `cancel` has returned.
    ///
    /// # Errors
    /// [`WaiterError::NotWaiting`] when no wait is in flight.
    pub async fn cancel(&self) -> Result<(), WaiterError> {
        let mut active = {
            let mut inner = self.inner.lock().expect("waiter lock poisoned");
            inner.session.take().ok_or(WaiterError::NotWaiting)?
        };
        info!(debt = %active.debt_id, "cancelling consent wait");

        if let Some(cancel) = active.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(task) = active.task.take() {
            if let Err(err) = task.await {
                debug!(error = %err, "wait task join failed");
            }
        }
        Ok(())
    }

    /// Current machine state with the presentational elapsed counter.
    #[must_use]
    pub fn status(&self) -> WaiterStatus {
        let inner = self.inner.lock().expect("waiter lock poisoned");
        match inner.session.as_ref() {
            Some(active) => WaiterStatus::Waiting {
                debt_id: active.debt_id.clone(),
                elapsed_secs: active.elapsed_secs.load(Ordering::SeqCst),
            },
            None => WaiterStatus::Idle,
        }
    }

    /// Whether a wait is in flight.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        matches!(self.status(), WaiterStatus::Waiting { .. })
    }

    /// Seconds since the current wait began, if waiting.
    #[must_use]
    pub fn elapsed_secs(&self) -> Option<u64> {
        match self.status() {
            WaiterStatus::Waiting { elapsed_secs, .. } => Some(elapsed_secs),
            WaiterStatus::Idle => None,
        }
    }
}

fn handler_id(generation: u64) -> String {
    format!("{HANDLER_PREFIX}#{generation}")
}

/// How the select loop exited.
enum Resolution {
    Outcome(ConsentOutcome),
    Cancelled,
}

/// State moved into the spawned wait task.
struct WaitTask {
    manager: Arc<ConnectionManager>,
    inner: Arc<Mutex<WaiterInner>>,
    config: WaiterConfig,
    pending: PendingConsent,
    generation: u64,
    handler_id: String,
    elapsed_secs: Arc<AtomicU64>,
    /// One-shot resolution guard: the terminal transition may be taken by
    /// exactly one path, even if a stale signal shows up late.
    resolved: AtomicBool,
    events: mpsc::UnboundedReceiver<ConnectionEvent>,
    cancel: oneshot::Receiver<()>,
    callback: Box<dyn FnOnce(ConsentOutcome) + Send>,
}

impl WaitTask {
    async fn run(mut self) {
        let timeout = time::sleep(self.config.consent_timeout);
        tokio::pin!(timeout);
        let mut tick = time::interval(self.config.tick_interval);
        // An interval's first tick completes immediately; consume it so the
        // counter starts at zero.
        tick.tick().await;
        let mut cancel = self.cancel;

        let resolution = loop {
            tokio::select! {
                () = &mut timeout => {
                    debug!(debt = %self.pending.debt_id(), "consent wait timed out");
                    break Resolution::Outcome(ConsentOutcome::Expired);
                }
                _ = &mut cancel => break Resolution::Cancelled,
                event = self.events.recv() => match event {
                    Some(ConnectionEvent::ConsentUpdate(update)) => {
                        match correlate(&update, self.pending.debt_id()) {
                            Some(outcome) => break Resolution::Outcome(outcome),
                            None => debug!(
                                debt = %self.pending.debt_id(),
                                "uncorrelated consent event ignored"
                            ),
                        }
                    }
                    Some(ConnectionEvent::Disconnected { .. }) => {
                        warn!(
                            debt = %self.pending.debt_id(),
                            "connection lost while waiting; treating as expired"
                        );
                        break Resolution::Outcome(ConsentOutcome::Expired);
                    }
                    Some(ConnectionEvent::Connected { .. }) => {}
                    None => {
                        warn!(
                            debt = %self.pending.debt_id(),
                            "event channel closed while waiting; treating as expired"
                        );
                        break Resolution::Outcome(ConsentOutcome::Expired);
                    }
                },
                _ = tick.tick() => {
                    self.elapsed_secs.fetch_add(1, Ordering::SeqCst);
                }
            }
        };

        // Single teardown path for every exit. The timeout timer dies with
        // this task, so it can never fire after teardown.
        self.manager.off(EventKind::ConsentUpdate, &self.handler_id);
        self.manager.off(EventKind::Disconnected, &self.handler_id);
        self.manager.disconnect().await;

        let status = match &resolution {
            Resolution::Outcome(outcome) => ConsentStatus::from(*outcome),
            Resolution::Cancelled => ConsentStatus::Cancelled,
        };
        if let Err(err) = self.pending.advance(status) {
            warn!(error = %err, "pending consent was already terminal");
            return;
        }

        // Back to Idle — but only clear our own generation; a newer wait
        // may already occupy the slot.
        {
            let mut inner = self.inner.lock().expect("waiter lock poisoned");
            if inner
                .session
                .as_ref()
                .is_some_and(|active| active.generation == self.generation)
            {
                inner.session = None;
            }
        }

        if self.resolved.swap(true, Ordering::SeqCst) {
            return;
        }
        match resolution {
            Resolution::Outcome(outcome) => {
                info!(
                    debt = %self.pending.debt_id(),
                    %outcome,
                    elapsed_secs = self.elapsed_secs.load(Ordering::SeqCst),
                    "consent resolved"
                );
                (self.callback)(outcome);
            }
            Resolution::Cancelled => {
                info!(debt = %self.pending.debt_id(), "consent wait cancelled");
            }
        }
    }
}
