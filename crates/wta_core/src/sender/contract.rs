//! Sender capability contract.

use crate::model::entity::EntityPayload;
use crate::model::report::{FailureDetail, RemoteId, SourceRecordId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SendResult<T> = Result<T, SendError>;

/// Sender errors. Destination-side rejections are not errors; they arrive as
/// `RemoteResponse::Failure`.
#[derive(Debug)]
pub enum SendError {
    /// Payload belongs to another entity type than the sender serves.
    PayloadMismatch { expected: String, actual: String },
    /// `last_response` was called before any `submit`.
    NoResponse,
    /// Destination reply does not follow the response protocol.
    MalformedResponse(String),
    /// Request could not be encoded for the wire.
    Encode(serde_json::Error),
}

impl Display for SendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PayloadMismatch { expected, actual } => write!(
                f,
                "sender for `{expected}` cannot submit a `{actual}` payload"
            ),
            Self::NoResponse => write!(f, "no response available; nothing was submitted"),
            Self::MalformedResponse(message) => {
                write!(f, "malformed destination response: {message}")
            }
            Self::Encode(err) => write!(f, "failed to encode request: {err}"),
        }
    }
}

impl Error for SendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SendError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Decoded outcome of the most recent submit.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteResponse {
    /// Destination stored the record under `remote_id`.
    Success { remote_id: RemoteId },
    /// Destination rejected the record or was unreachable.
    Failure { detail: FailureDetail },
}

/// Transmits entity payloads to the bound destination.
pub trait Sender {
    /// Entity type this sender serves.
    fn entity_type(&self) -> &str;

    /// Transmits `payload`; the source record id travels with it.
    ///
    /// Fails only for local misuse. Delivery problems show up in
    /// `last_response`.
    fn submit(
        &mut self,
        source_record_id: SourceRecordId,
        payload: &dyn EntityPayload,
    ) -> SendResult<()>;

    /// Outcome of the most recent `submit`.
    fn last_response(&self) -> SendResult<RemoteResponse>;
}

/// Rejects payloads addressed to a different entity type.
pub fn ensure_payload_type(expected: &str, payload: &dyn EntityPayload) -> SendResult<()> {
    if payload.entity_type() == expected {
        return Ok(());
    }
    Err(SendError::PayloadMismatch {
        expected: expected.to_string(),
        actual: payload.entity_type().to_string(),
    })
}
