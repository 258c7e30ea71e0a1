//! # Consent Domain
//!
//! Pure logic with no I/O: the pending-consent lifecycle and the
//! event-to-outcome correlator. Everything here is synchronously testable.

mod correlator;
mod pending;

pub use correlator::correlate;
pub use pending::{ConsentTransitionError, PendingConsent};
