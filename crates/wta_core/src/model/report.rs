//! Delivery report model.
//!
//! # Responsibility
//! - Describe the durable record of one delivery attempt.
//! - Describe the per-call outcome handed back to delivery callers.
//!
//! # Invariants
//! - `report_id` is assigned by the report store and never reused.
//! - `remote_id` is set only for `Confirmed`, `failure_detail` only for `Failed`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Store-assigned identifier of one delivery report.
pub type ReportId = i64;

/// Caller-supplied identifier of the local record being delivered.
pub type SourceRecordId = i64;

/// Destination-assigned identifier returned on successful delivery.
pub type RemoteId = i64;

/// Destination-defined failure payload, kept verbatim.
pub type FailureDetail = Value;

/// Lifecycle state of one delivery report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportState {
    /// Send was issued; outcome not recorded yet.
    Pending,
    /// Destination accepted the record.
    Confirmed,
    /// Destination rejected the record or could not be reached.
    Failed,
}

impl ReportState {
    /// Stable storage value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Durable record of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub report_id: ReportId,
    /// Correlation id unique across all report tables.
    pub attempt_id: Uuid,
    pub source_record_id: SourceRecordId,
    pub state: ReportState,
    pub remote_id: Option<RemoteId>,
    pub failure_detail: Option<FailureDetail>,
    /// Unix epoch milliseconds.
    pub sent_at: i64,
    /// Unix epoch milliseconds; `None` while pending.
    pub resolved_at: Option<i64>,
}

/// Value returned to the caller of one delivery.
///
/// Destination-side rejections are data here, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub report_id: ReportId,
    pub source_record_id: SourceRecordId,
    pub success: bool,
    pub remote_id: Option<RemoteId>,
    pub detail: Option<FailureDetail>,
}

impl DeliveryOutcome {
    pub fn confirmed(
        report_id: ReportId,
        source_record_id: SourceRecordId,
        remote_id: RemoteId,
    ) -> Self {
        Self {
            report_id,
            source_record_id,
            success: true,
            remote_id: Some(remote_id),
            detail: None,
        }
    }

    pub fn failed(
        report_id: ReportId,
        source_record_id: SourceRecordId,
        detail: FailureDetail,
    ) -> Self {
        Self {
            report_id,
            source_record_id,
            success: false,
            remote_id: None,
            detail: Some(detail),
        }
    }
}
