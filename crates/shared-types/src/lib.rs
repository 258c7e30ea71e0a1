//! # Shared Types Crate
//!
//! Domain primitives and wire payloads for the debt-consent workflow.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: all cross-crate identifiers, consent enums
//!   and wire payloads are defined here.
//! - **Permissive at the wire, strict in the domain**: the inbound
//!   `ConsentUpdate` payload tolerates string-or-number identifiers and
//!   unknown action strings; everything past the parse boundary is a closed
//!   enum.

pub mod consent;
pub mod ids;
pub mod wire;

pub use consent::{ConsentAction, ConsentOutcome, ConsentStatus};
pub use ids::{DebtId, MerchantId};
pub use wire::{ConsentUpdate, WireDebtId, CONSENT_UPDATE_EVENT};
