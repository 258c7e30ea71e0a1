//! # Consent Subsystem
//!
//! The behavioral core of the debt-consent workflow.
//!
//! ## Architecture
//!
//! - **Domain layer** (pure, no I/O): [`PendingConsent`] enforces the
//!   one-way status lifecycle; [`correlate`] filters and maps inbound wire
//!   events to typed outcomes.
//! - **Service layer**: [`ConsentWaiter`] drives the
//!   `Idle → Waiting → terminal` state machine over a shared
//!   [`dc_connection::ConnectionManager`], owning the timeout timer, the
//!   presentational elapsed-seconds tick, and exactly-once outcome delivery.
//!
//! ## State diagram
//!
//! ```text
//!              start_waiting(debt, merchant)
//!     Idle ──────────────────────────────────► Waiting(debt, started_at)
//!      ▲                                          │
//!      │   first of: correlated accept/reject,    │
//!      │   unintentional disconnect (⇒ Expired),  │
//!      │   timeout fire (⇒ Expired), cancel()     │
//!      └──────────────────────────────────────────┘
//!        teardown: clear timer, unregister handlers, disconnect;
//!        callback fires exactly once (never for cancel)
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod service;

pub use domain::{correlate, ConsentTransitionError, PendingConsent};
pub use service::{
    ConsentWaiter, OutcomeNotifier, TracingNotifier, WaiterConfig, WaiterError, WaiterStatus,
};
