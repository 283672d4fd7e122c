//! Senders: submit entity payloads to a destination and expose the reply.
//!
//! # Responsibility
//! - Define the sender capability contract used by the orchestrator.
//! - Provide the built-in line-delimited JSON sender and its TCP transport.
//!
//! # Invariants
//! - One sender instance is bound to one destination endpoint for its lifetime.
//! - `submit` never reports the outcome; `last_response` does.

pub mod contract;
pub mod transport;
pub mod wire;
