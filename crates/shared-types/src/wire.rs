//! # Wire Payloads
//!
//! Inbound event payloads as they arrive over the persistent connection.
//!
//! The transport delivers named events; the one this workflow consumes is
//! [`CONSENT_UPDATE_EVENT`] with a JSON payload of the shape:
//!
//! ```json
//! { "debtId": "42", "action": "accepted" }
//! ```
//!
//! `debtId` may arrive as a JSON string or number depending on the emitting
//! service; both normalize to the same identifier. `action` is kept as a raw
//! string at this layer so a malformed value deserializes cleanly and can be
//! dropped downstream instead of poisoning the whole frame.

use serde::{Deserialize, Serialize};

use crate::consent::ConsentAction;
use crate::ids::DebtId;

/// Name of the wire event carrying consent decisions.
pub const CONSENT_UPDATE_EVENT: &str = "debt.consent.update";

/// A debt identifier as it appears on the wire: string or number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireDebtId {
    /// String form, passed through as-is.
    Text(String),
    /// Numeric form, normalized via decimal formatting.
    Number(i64),
}

impl WireDebtId {
    /// Normalize to the canonical string form used for correlation.
    #[must_use]
    pub fn normalized(&self) -> DebtId {
        match self {
            Self::Text(s) => DebtId::new(s.clone()),
            Self::Number(n) => DebtId::new(n.to_string()),
        }
    }
}

/// Inbound `debt.consent.update` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentUpdate {
    /// Echoed debt identifier; matched against the debt under observation.
    pub debt_id: WireDebtId,
    /// Raw customer action string.
    pub action: String,
}

impl ConsentUpdate {
    /// The typed action, or `None` when the wire value is unknown/malformed.
    #[must_use]
    pub fn action(&self) -> Option<ConsentAction> {
        ConsentAction::parse(&self.action)
    }

    /// The string-normalized debt identifier.
    #[must_use]
    pub fn debt_id(&self) -> DebtId {
        self.debt_id.normalized()
    }
}
