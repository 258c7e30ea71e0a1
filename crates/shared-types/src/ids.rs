//! # Identifiers
//!
//! Opaque newtypes for the two identities the consent workflow cares about:
//! the merchant (keys the socket connection) and the debt (keys correlation).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies the merchant whose logical connection carries consent events.
///
/// At most one live connection exists per `MerchantId` at a time; the
/// connection manager enforces this invariant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MerchantId(String);

impl MerchantId {
    /// Create a merchant identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier, as sent in the connection query string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MerchantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MerchantId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifies a single debt under observation.
///
/// Assigned by the external debt-creation API and immutable for the lifetime
/// of a wait. Stored in its string-normalized form so that wire identifiers
/// arriving as JSON numbers compare equal (see [`crate::wire::WireDebtId`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DebtId(String);

impl DebtId {
    /// Create a debt identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The normalized string form used for correlation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DebtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DebtId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<u64> for DebtId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}
