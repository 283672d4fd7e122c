//! Report store contract and persistence implementations.
//!
//! # Responsibility
//! - Define the capability set every per-entity report store provides.
//! - Keep SQL details behind the contract so the orchestrator stays storage-agnostic.
//!
//! # Invariants
//! - A report enters `Pending` on creation and leaves it at most once.
//! - Terminal transitions on non-pending reports fail with `InvalidReportState`.

pub mod report_store;
pub mod sqlite_store;
