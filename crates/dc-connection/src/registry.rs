//! # Handler Registry
//!
//! Bookkeeping for typed event subscriptions. Handlers are unbounded channel
//! senders registered under a caller-chosen id per [`EventKind`]:
//! re-registering the same `(kind, id)` replaces the previous sender, so a
//! double registration never double-delivers; unregistering an absent id is
//! a no-op.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::debug;

use crate::events::{ConnectionEvent, EventKind};

#[derive(Default)]
pub(crate) struct HandlerRegistry {
    handlers: HashMap<EventKind, HashMap<String, mpsc::UnboundedSender<ConnectionEvent>>>,
}

impl HandlerRegistry {
    /// Register `sender` under `(kind, id)`, replacing any previous
    /// registration for the same pair.
    pub(crate) fn register(
        &mut self,
        kind: EventKind,
        id: String,
        sender: mpsc::UnboundedSender<ConnectionEvent>,
    ) {
        let replaced = self
            .handlers
            .entry(kind)
            .or_default()
            .insert(id.clone(), sender)
            .is_some();
        debug!(?kind, handler = %id, replaced, "handler registered");
    }

    /// Remove the registration for `(kind, id)`. No-op when absent.
    pub(crate) fn unregister(&mut self, kind: EventKind, id: &str) {
        let removed = self
            .handlers
            .get_mut(&kind)
            .and_then(|slot| slot.remove(id))
            .is_some();
        debug!(?kind, handler = %id, removed, "handler unregistered");
    }

    /// Drop every registration for `kind` (one-shot disconnect semantics).
    pub(crate) fn clear(&mut self, kind: EventKind) {
        self.handlers.remove(&kind);
    }

    /// Deliver `event` to every handler registered for its kind.
    ///
    /// Handlers whose receiving side has gone away are pruned. Returns the
    /// number of live handlers that received the event.
    pub(crate) fn dispatch(&mut self, event: &ConnectionEvent) -> usize {
        let Some(slot) = self.handlers.get_mut(&event.kind()) else {
            return 0;
        };

        let mut delivered = 0;
        slot.retain(|id, sender| match sender.send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(_) => {
                debug!(handler = %id, "pruned dead handler");
                false
            }
        });
        delivered
    }
}
