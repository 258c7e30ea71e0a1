//! # Outcome Notifier
//!
//! Seam toward the user-facing presenter (toast messages in the dashboard).
//! The presenter receives the terminal outcome enum and nothing else — it
//! never calls back into the consent core.

use shared_types::{ConsentOutcome, DebtId};
use tracing::{info, warn};

/// Consumes terminal outcomes for user feedback.
pub trait OutcomeNotifier: Send + Sync {
    /// Present the outcome of a resolved wait.
    fn notify(&self, debt_id: &DebtId, outcome: ConsentOutcome);
}

/// Notifier that renders outcomes as log lines: accepted at info level,
/// rejected/expired at warn (mirroring the success/error toast styling).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl OutcomeNotifier for TracingNotifier {
    fn notify(&self, debt_id: &DebtId, outcome: ConsentOutcome) {
        match outcome {
            ConsentOutcome::Accepted => {
                info!(debt = %debt_id, "debt consent accepted");
            }
            ConsentOutcome::Rejected => {
                warn!(debt = %debt_id, "debt consent rejected");
            }
            ConsentOutcome::Expired => {
                warn!(debt = %debt_id, "debt consent expired without a decision");
            }
        }
    }
}
