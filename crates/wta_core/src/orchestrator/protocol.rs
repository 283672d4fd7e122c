//! Stateless delivery protocol.

use crate::dispatch::registry::RegistryError;
use crate::model::entity::EntityPayload;
use crate::model::report::{DeliveryOutcome, SourceRecordId};
use crate::sender::contract::{RemoteResponse, SendError, Sender};
use crate::store::report_store::{ReportStore, StoreError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Hard failures of a delivery: configuration, storage or local misuse.
#[derive(Debug)]
pub enum DeliveryError {
    Registry(RegistryError),
    Store(StoreError),
    Send(SendError),
}

impl Display for DeliveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registry(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "report store error: {err}"),
            Self::Send(err) => write!(f, "sender error: {err}"),
        }
    }
}

impl Error for DeliveryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Registry(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Send(err) => Some(err),
        }
    }
}

impl From<RegistryError> for DeliveryError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<StoreError> for DeliveryError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<SendError> for DeliveryError {
    fn from(value: SendError) -> Self {
        Self::Send(value)
    }
}

/// Delivers one record through an already-resolved handler pair.
///
/// Order: submit, create the pending report, read the reply, resolve the
/// report. A crash between submit and report creation leaves no local trace
/// of a send the destination may have accepted.
///
/// # Errors
/// - `Send` when the payload does not fit the sender or the reply is malformed.
///   A malformed reply leaves the report `Pending`.
/// - `Store` when report bookkeeping fails.
pub fn run_delivery(
    sender: &mut dyn Sender,
    store: &dyn ReportStore,
    source_record_id: SourceRecordId,
    payload: &dyn EntityPayload,
) -> Result<DeliveryOutcome, DeliveryError> {
    let started_at = Instant::now();
    let entity_type = payload.entity_type().to_string();

    sender.submit(source_record_id, payload)?;
    let report_id = store.record_send_attempt(source_record_id)?;

    let response = sender.last_response().map_err(|err| {
        error!(
            "event=deliver module=orchestrator status=error entity_type={entity_type} source_record_id={source_record_id} report_id={report_id} error_code=bad_response error={err}"
        );
        err
    })?;

    let outcome = match response {
        RemoteResponse::Success { remote_id } => {
            store.mark_confirmed(report_id, remote_id)?;
            DeliveryOutcome::confirmed(report_id, source_record_id, remote_id)
        }
        RemoteResponse::Failure { detail } => {
            store.mark_failed(report_id, &detail)?;
            DeliveryOutcome::failed(report_id, source_record_id, detail)
        }
    };

    if outcome.success {
        info!(
            "event=deliver module=orchestrator status=ok entity_type={entity_type} source_record_id={source_record_id} report_id={report_id} duration_ms={}",
            started_at.elapsed().as_millis()
        );
    } else {
        warn!(
            "event=deliver module=orchestrator status=rejected entity_type={entity_type} source_record_id={source_record_id} report_id={report_id} duration_ms={}",
            started_at.elapsed().as_millis()
        );
    }
    Ok(outcome)
}
