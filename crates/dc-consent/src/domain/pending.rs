//! # Pending Consent
//!
//! The unit of work being awaited, tracked through an explicit forward-only
//! state machine. Every transition goes through [`PendingConsent::advance`],
//! which enforces two invariants:
//!
//! 1. **One-way lifecycle.** `Waiting` moves to exactly one of
//!    `Accepted | Rejected | Expired | Cancelled`; no status is ever
//!    revisited.
//! 2. **Terminal means terminal.** Any transition out of a terminal status
//!    returns [`ConsentTransitionError`] and leaves the consent unchanged.

use std::time::Instant;

use thiserror::Error;

use shared_types::{ConsentStatus, DebtId, MerchantId};

/// Returned when a status transition is not legal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal consent transition: {from:?} -> {to:?}")]
pub struct ConsentTransitionError {
    /// Status the consent held when the transition was attempted.
    pub from: ConsentStatus,
    /// The rejected target status.
    pub to: ConsentStatus,
}

/// A debt awaiting a customer decision.
#[derive(Debug, Clone)]
pub struct PendingConsent {
    debt_id: DebtId,
    merchant_id: MerchantId,
    started_at: Instant,
    status: ConsentStatus,
}

impl PendingConsent {
    /// Begin waiting on a debt. Starts in [`ConsentStatus::Waiting`].
    #[must_use]
    pub fn new(debt_id: DebtId, merchant_id: MerchantId) -> Self {
        Self {
            debt_id,
            merchant_id,
            started_at: Instant::now(),
            status: ConsentStatus::Waiting,
        }
    }

    /// The debt under observation.
    #[must_use]
    pub fn debt_id(&self) -> &DebtId {
        &self.debt_id
    }

    /// The merchant whose connection carries this consent.
    #[must_use]
    pub fn merchant_id(&self) -> &MerchantId {
        &self.merchant_id
    }

    /// When the wait began.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> ConsentStatus {
        self.status
    }

    /// Move to a terminal status.
    ///
    /// # Errors
    /// Returns [`ConsentTransitionError`] when the consent is already
    /// terminal or `to` is [`ConsentStatus::Waiting`]; the status is left
    /// unchanged.
    pub fn advance(&mut self, to: ConsentStatus) -> Result<(), ConsentTransitionError> {
        if self.status.is_terminal() || !to.is_terminal() {
            return Err(ConsentTransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}
