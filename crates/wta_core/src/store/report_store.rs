//! Report store capability contract.

use crate::db::DbError;
use crate::model::endpoint::{DestinationId, Endpoint};
use crate::model::report::{
    DeliveryReport, FailureDetail, RemoteId, ReportId, ReportState, SourceRecordId,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type StoreResult<T> = Result<T, StoreError>;

/// Report store errors.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// No endpoint metadata exists for the destination.
    EndpointNotFound(DestinationId),
    ReportNotFound(ReportId),
    /// Terminal transition requested on a report that already left `Pending`.
    InvalidReportState {
        report_id: ReportId,
        state: ReportState,
    },
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::EndpointNotFound(id) => write!(f, "no endpoint registered for destination {id}"),
            Self::ReportNotFound(id) => write!(f, "delivery report not found: {id}"),
            Self::InvalidReportState { report_id, state } => write!(
                f,
                "delivery report {report_id} is already {}; only pending reports can be resolved",
                state.as_str()
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted report data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage parameters a report store is constructed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageParams {
    /// SQLite file path; `:memory:` opens a private in-memory database.
    pub database_path: PathBuf,
    /// Site whose endpoint the session delivers to.
    pub destination_id: DestinationId,
}

impl StorageParams {
    pub fn new(database_path: impl Into<PathBuf>, destination_id: DestinationId) -> Self {
        Self {
            database_path: database_path.into(),
            destination_id,
        }
    }
}

/// Per-entity-type report bookkeeping and endpoint lookup.
///
/// Implementations differ only in the records they address; the lifecycle is
/// identical for every entity type.
pub trait ReportStore {
    /// Resolves where senders must submit data for `destination_id`.
    fn fetch_destination_endpoint(&self, destination_id: DestinationId) -> StoreResult<Endpoint>;

    /// Creates a `Pending` report for one attempt and returns its id.
    fn record_send_attempt(&self, source_record_id: SourceRecordId) -> StoreResult<ReportId>;

    /// `Pending -> Confirmed`, storing the destination-assigned id.
    fn mark_confirmed(&self, report_id: ReportId, remote_id: RemoteId) -> StoreResult<()>;

    /// `Pending -> Failed`, storing the failure payload verbatim.
    fn mark_failed(&self, report_id: ReportId, detail: &FailureDetail) -> StoreResult<()>;

    /// Loads one report by id.
    fn get_report(&self, report_id: ReportId) -> StoreResult<Option<DeliveryReport>>;
}
