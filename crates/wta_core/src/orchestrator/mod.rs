//! Delivery orchestration: send, record, then confirm or fail.
//!
//! # Responsibility
//! - Run the three-phase delivery protocol over a resolved sender/store pair.
//! - Build per-entity-type sessions from the dispatch registry.
//!
//! # Invariants
//! - The report is created after submit and before the reply is inspected.
//! - Destination rejections return `Ok` with `success = false`.
//! - Unknown entity types fail before any handler is constructed.

mod protocol;
mod session;

pub use protocol::{run_delivery, DeliveryError};
pub use session::DeliveryOrchestrator;
