//! Cross-crate integration flows.

pub mod consent_flow;
pub mod resilience;
