//! # Consent Service
//!
//! The async shell around the domain: the waiter state machine, its
//! configuration, and the outcome-notifier seam toward the UI layer.

mod config;
mod notify;
mod waiter;

pub use config::WaiterConfig;
pub use notify::{OutcomeNotifier, TracingNotifier};
pub use waiter::{ConsentWaiter, WaiterError, WaiterStatus};
