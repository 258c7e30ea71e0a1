//! # Consent Enums
//!
//! The closed vocabulary of the consent workflow: what the customer did on
//! the wire ([`ConsentAction`]), what the caller is told ([`ConsentOutcome`])
//! and where a pending consent sits in its lifecycle ([`ConsentStatus`]).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Wire-level customer decision carried by a `debt.consent.update` event.
///
/// The server normally pushes `accepted` or `rejected`; an explicit
/// `expired` may also arrive when the customer-side link lapses before a
/// decision. Unknown action strings are not representable here — they are
/// dropped at the parse boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentAction {
    /// Customer accepted the debt.
    Accepted,
    /// Customer rejected the debt.
    Rejected,
    /// Server-side expiry of the consent window.
    Expired,
}

impl ConsentAction {
    /// Parse a raw wire action string. Unknown values yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

/// Terminal outcome delivered to the caller exactly once per wait.
///
/// Cancellation is deliberately absent: a cancelled wait is acknowledged at
/// the `cancel()` call site and never reported through the outcome channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsentOutcome {
    /// Customer accepted the debt.
    Accepted,
    /// Customer rejected the debt.
    Rejected,
    /// No qualifying decision arrived: timeout, unintentional disconnect,
    /// or an explicit server-side expiry.
    Expired,
}

impl From<ConsentAction> for ConsentOutcome {
    fn from(action: ConsentAction) -> Self {
        match action {
            ConsentAction::Accepted => Self::Accepted,
            ConsentAction::Rejected => Self::Rejected,
            ConsentAction::Expired => Self::Expired,
        }
    }
}

impl fmt::Display for ConsentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted => f.write_str("accepted"),
            Self::Rejected => f.write_str("rejected"),
            Self::Expired => f.write_str("expired"),
        }
    }
}

/// Lifecycle status of a pending consent.
///
/// Transitions are one-way: `Waiting` moves to exactly one terminal status
/// and no status is ever revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsentStatus {
    /// A decision is being awaited.
    Waiting,
    /// Customer accepted. **Terminal.**
    Accepted,
    /// Customer rejected. **Terminal.**
    Rejected,
    /// The wait lapsed without a decision. **Terminal.**
    Expired,
    /// The caller abandoned the wait. **Terminal.**
    Cancelled,
}

impl ConsentStatus {
    /// Returns `true` if no further transitions are possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Waiting)
    }
}

impl From<ConsentOutcome> for ConsentStatus {
    fn from(outcome: ConsentOutcome) -> Self {
        match outcome {
            ConsentOutcome::Accepted => Self::Accepted,
            ConsentOutcome::Rejected => Self::Rejected,
            ConsentOutcome::Expired => Self::Expired,
        }
    }
}
