//! # Connection Events
//!
//! The closed set of events the manager dispatches to registered handlers.
//! Replaces stringly-typed socket channel names with a tagged enum so a typo
//! can no longer silently drop a handler registration; only the wire
//! boundary keeps the literal `debt.consent.update` frame name.

use shared_types::{ConsentUpdate, MerchantId};

/// Discriminant used for handler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Inbound customer decision on the consent channel.
    ConsentUpdate,
    /// Transport session established for a merchant.
    Connected,
    /// Transport session dropped by the remote side or a transport error.
    ///
    /// Never dispatched for a manager-initiated `disconnect()`.
    Disconnected,
}

/// An event delivered to registered handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// A parsed `debt.consent.update` payload.
    ConsentUpdate(ConsentUpdate),
    /// The connection for `merchant_id` is live.
    Connected {
        /// Merchant whose session was established.
        merchant_id: MerchantId,
    },
    /// The transport dropped without a `disconnect()` call.
    Disconnected {
        /// Merchant whose session was lost.
        merchant_id: MerchantId,
    },
}

impl ConnectionEvent {
    /// The registration discriminant this event is routed under.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ConsentUpdate(_) => EventKind::ConsentUpdate,
            Self::Connected { .. } => EventKind::Connected,
            Self::Disconnected { .. } => EventKind::Disconnected,
        }
    }
}
