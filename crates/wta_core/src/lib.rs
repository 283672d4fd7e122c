//! Core of the WServer-to-AR relay.
//! Delivers local records to a remote authority and keeps a durable report
//! of every attempt.

pub mod config;
pub mod db;
pub mod dispatch;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod sender;
pub mod store;

pub use config::{ConfigError, RelayConfig, TransportConfig};
pub use dispatch::builtin::{register_builtin, sqlite_store_factory, wire_sender_factory};
pub use dispatch::factory::{ReportStoreFactory, SenderFactory};
pub use dispatch::registry::{DispatchRegistry, HandlerPair, RegistryError, SharedRegistry};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::endpoint::{DestinationId, Endpoint};
pub use model::entity::{
    builtin_entity_types, Company, EntityPayload, Operator, TrashCategory, TrashType, Vehicle,
    ENTITY_AUTO, ENTITY_COMPANIES, ENTITY_TRASH_CATS, ENTITY_TRASH_TYPES, ENTITY_USERS,
};
pub use model::report::{
    DeliveryOutcome, DeliveryReport, FailureDetail, RemoteId, ReportId, ReportState,
    SourceRecordId,
};
pub use orchestrator::{run_delivery, DeliveryError, DeliveryOrchestrator};
pub use sender::contract::{RemoteResponse, SendError, SendResult, Sender};
pub use sender::transport::{TcpTransport, Transport, TransportOptions, MAX_REPLY_BYTES};
pub use sender::wire::WireSender;
pub use store::report_store::{ReportStore, StorageParams, StoreError, StoreResult};
pub use store::sqlite_store::{ReportListQuery, ReportTable, SqliteReportStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
