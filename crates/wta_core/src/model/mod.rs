//! Domain model for relayed records and their delivery bookkeeping.
//!
//! # Responsibility
//! - Define the fixed payload shapes sent to the destination.
//! - Define delivery report identity, lifecycle state and outcome values.
//!
//! # Invariants
//! - A report is created `Pending` and reaches exactly one terminal state.
//! - Payload shapes are named field sets; the orchestrator never inspects them.

pub mod endpoint;
pub mod entity;
pub mod report;
