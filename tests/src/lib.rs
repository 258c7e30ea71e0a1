//! # Debt-Consent Test Suite
//!
//! Unified test crate for flows that cross crate boundaries: the consent
//! waiter driving the connection manager over the in-memory transport.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── consent_flow.rs   # Happy-path resolution and correlation
//!     └── resilience.rs     # Timeout, disconnect, cancellation, races
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p dc-tests
//!
//! # By category
//! cargo test -p dc-tests integration::consent_flow::
//! cargo test -p dc-tests integration::resilience::
//! ```

pub mod integration;
