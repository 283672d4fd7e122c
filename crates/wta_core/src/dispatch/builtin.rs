//! Built-in entity type bindings.

use crate::dispatch::factory::{ReportStoreFactory, SenderFactory};
use crate::dispatch::registry::DispatchRegistry;
use crate::model::entity::builtin_entity_types;
use crate::sender::contract::Sender;
use crate::sender::transport::TransportOptions;
use crate::sender::wire::WireSender;
use crate::store::report_store::ReportStore;
use crate::store::sqlite_store::{ReportTable, SqliteReportStore};

impl DispatchRegistry {
    /// Registry preloaded with every built-in entity type.
    pub fn with_builtin(options: TransportOptions) -> Self {
        let mut registry = Self::new();
        register_builtin(&mut registry, options);
        registry
    }
}

/// Registers the built-in entity types, replacing same-named bindings.
pub fn register_builtin(registry: &mut DispatchRegistry, options: TransportOptions) {
    for &entity_type in builtin_entity_types() {
        let Some(table) = ReportTable::for_entity_type(entity_type) else {
            continue;
        };
        registry.register(
            entity_type,
            wire_sender_factory(entity_type, options),
            sqlite_store_factory(table),
        );
    }
}

/// Factory for a TCP wire sender serving `entity_type`.
pub fn wire_sender_factory(entity_type: &str, options: TransportOptions) -> SenderFactory {
    let entity_type = entity_type.to_string();
    SenderFactory::new(move |endpoint| {
        let sender: Box<dyn Sender> = Box::new(WireSender::tcp(
            entity_type.clone(),
            endpoint.clone(),
            options,
        ));
        Ok(sender)
    })
}

/// Factory for a SQLite report store addressing `table`.
pub fn sqlite_store_factory(table: ReportTable) -> ReportStoreFactory {
    ReportStoreFactory::new(move |params| {
        let store: Box<dyn ReportStore> = Box::new(SqliteReportStore::open(params, table)?);
        Ok(store)
    })
}
