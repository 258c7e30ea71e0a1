//! # Transport Adapters
//!
//! Concrete [`crate::ports::ConsentTransport`] implementations.
//!
//! - [`InMemoryTransport`] — in-process adapter for tests and local wiring.
//! - [`WebSocketTransport`] — production adapter over tokio-tungstenite.
//!   Requires feature: `websocket`.

mod in_memory;

#[cfg(feature = "websocket")]
mod websocket;

pub use in_memory::InMemoryTransport;

#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConfig, WebSocketTransport};
