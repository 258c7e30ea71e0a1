//! # Consent Correlator
//!
//! Pure filter/mapper invoked per inbound event. No state of its own:
//! matching is a string-normalized identifier comparison, mapping is the
//! closed wire-action vocabulary. Anything that does not match or does not
//! parse yields `None` and must leave the caller's state untouched — other
//! merchants and tabs share infrastructure, so irrelevant events are routine
//! rather than exceptional.

use shared_types::{ConsentOutcome, ConsentUpdate, DebtId};

/// Map a wire event onto the debt under observation.
///
/// Returns the typed outcome when the event's identifier matches `debt_id`
/// after normalization and its action is well-formed; `None` otherwise.
#[must_use]
pub fn correlate(update: &ConsentUpdate, debt_id: &DebtId) -> Option<ConsentOutcome> {
    if update.debt_id() != *debt_id {
        return None;
    }
    update.action().map(ConsentOutcome::from)
}
