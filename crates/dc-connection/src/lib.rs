//! # Connection Subsystem
//!
//! Owns the single logical socket connection keyed by a merchant identity
//! and surfaces inbound wire events through a typed subscription interface.
//!
//! ## Architecture
//!
//! The crate follows a ports-and-adapters split:
//!
//! - **Ports:** [`ConsentTransport`] abstracts the physical connection; a
//!   session is an inbound frame channel plus a close handle.
//! - **Adapters:** [`adapters::InMemoryTransport`] for tests and local
//!   wiring; [`adapters::WebSocketTransport`] (feature `websocket`) for the
//!   production endpoint.
//! - **Manager:** [`ConnectionManager`] enforces the one-connection-per-
//!   merchant invariant and dispatches [`ConnectionEvent`]s to registered
//!   handlers.
//!
//! ```text
//! ┌───────────┐   open(merchant)    ┌────────────────────┐
//! │ Transport │ ◄────────────────── │ ConnectionManager  │
//! │ (adapter) │ ──InboundFrame────► │  pump task         │
//! └───────────┘                     │    │ dispatch      │
//!                                   └────┼───────────────┘
//!                                        ▼
//!                              on(kind, handler_id, tx)
//! ```
//!
//! ## Invariants
//!
//! - At most one live transport session per manager at any time; only the
//!   manager creates or destroys sessions.
//! - `connect` is idempotent per merchant; a connect for a different
//!   merchant tears the prior session down first.
//! - The manager's own teardown never re-enters the unintentional-disconnect
//!   path (no feedback loop).

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod events;
pub mod manager;
pub mod ports;

mod registry;

pub use events::{ConnectionEvent, EventKind};
pub use manager::ConnectionManager;
pub use ports::{CloseHandle, ConsentTransport, InboundFrame, TransportError, TransportSession};
