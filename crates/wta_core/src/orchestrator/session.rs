//! Per-entity-type delivery session.

use crate::dispatch::registry::DispatchRegistry;
use crate::model::endpoint::Endpoint;
use crate::model::entity::EntityPayload;
use crate::model::report::{DeliveryOutcome, SourceRecordId};
use crate::orchestrator::protocol::{run_delivery, DeliveryError};
use crate::sender::contract::Sender;
use crate::store::report_store::{ReportStore, StorageParams};
use log::{error, info};
use std::fmt::{Debug, Formatter};

/// One bound sender and one bound report store for a single entity type and
/// destination.
///
/// Not meant to be shared across destinations; build a new session instead.
pub struct DeliveryOrchestrator {
    entity_type: String,
    endpoint: Endpoint,
    sender: Box<dyn Sender>,
    store: Box<dyn ReportStore>,
}

impl DeliveryOrchestrator {
    /// Resolves handlers for `entity_type` and binds them to the destination
    /// named in `storage`.
    ///
    /// # Errors
    /// - `Registry` for an unbound name, before any handler is built.
    /// - `Store` when the database cannot be opened or the destination has no
    ///   endpoint.
    pub fn connect(
        registry: &DispatchRegistry,
        entity_type: &str,
        storage: &StorageParams,
    ) -> Result<Self, DeliveryError> {
        let handlers = registry.resolve(entity_type).map_err(|err| {
            error!(
                "event=session_open module=orchestrator status=error entity_type={entity_type} error_code=unknown_entity_type"
            );
            err
        })?;

        let store = handlers.report_store.build(storage)?;
        let endpoint = store
            .fetch_destination_endpoint(storage.destination_id)
            .map_err(|err| {
                error!(
                    "event=session_open module=orchestrator status=error entity_type={entity_type} destination_id={} error={err}",
                    storage.destination_id
                );
                err
            })?;
        let sender = handlers.sender.build(&endpoint)?;

        info!(
            "event=session_open module=orchestrator status=ok entity_type={entity_type} destination_id={} endpoint={endpoint}",
            storage.destination_id
        );
        Ok(Self {
            entity_type: entity_type.to_string(),
            endpoint,
            sender,
            store,
        })
    }

    /// Runs send, record and confirm/fail for one record.
    pub fn deliver(
        &mut self,
        source_record_id: SourceRecordId,
        payload: &dyn EntityPayload,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        run_delivery(
            self.sender.as_mut(),
            self.store.as_ref(),
            source_record_id,
            payload,
        )
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Bound report store, for inspecting reports after delivery.
    pub fn report_store(&self) -> &dyn ReportStore {
        self.store.as_ref()
    }
}

impl Debug for DeliveryOrchestrator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryOrchestrator")
            .field("entity_type", &self.entity_type)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
