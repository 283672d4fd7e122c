//! Entity-type dispatch: name to handler-pair bindings.
//!
//! # Responsibility
//! - Map entity type names to sender and report-store factories.
//! - Provide the bindings every process starts with.
//!
//! # Invariants
//! - At most one binding per name; re-registering replaces it.
//! - Resolution of an unbound name is the only validation gate of a delivery.

pub mod builtin;
pub mod factory;
pub mod registry;
