//! Built-in sender speaking the destination's JSON command protocol.
//!
//! Request line: `{"method": "add_auto", "params": {...}}`.
//! Reply line: `{"info": {"status": "success", "info": [[<remote_id>, ...], ...]}}`.
//! Any status other than `success` is a rejection whose detail is the inner
//! `info` value, kept verbatim.

use crate::model::endpoint::Endpoint;
use crate::model::entity::EntityPayload;
use crate::model::report::SourceRecordId;
use crate::sender::contract::{ensure_payload_type, RemoteResponse, SendError, SendResult, Sender};
use crate::sender::transport::{TcpTransport, Transport, TransportOptions};
use log::{info, warn};
use serde_json::{json, Value};

const STATUS_SUCCESS: &str = "success";
const TRANSPORT_ERROR_CODE: &str = "transport_error";

#[derive(Debug, Clone, PartialEq)]
enum LastReply {
    Line(String),
    /// Exchange failed before a reply arrived.
    Unreachable(String),
}

/// Sender for one entity type over one transport.
pub struct WireSender {
    entity_type: String,
    transport: Box<dyn Transport>,
    last_reply: Option<LastReply>,
}

impl WireSender {
    pub fn new(entity_type: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        Self {
            entity_type: entity_type.into(),
            transport,
            last_reply: None,
        }
    }

    /// Sender over a TCP transport bound to `endpoint`.
    pub fn tcp(
        entity_type: impl Into<String>,
        endpoint: Endpoint,
        options: TransportOptions,
    ) -> Self {
        Self::new(entity_type, Box::new(TcpTransport::new(endpoint, options)))
    }
}

impl Sender for WireSender {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn submit(
        &mut self,
        source_record_id: SourceRecordId,
        payload: &dyn EntityPayload,
    ) -> SendResult<()> {
        ensure_payload_type(&self.entity_type, payload)?;
        let request = encode_request(source_record_id, payload)?;

        self.last_reply = match self.transport.exchange(&request) {
            Ok(line) => {
                info!(
                    "event=entity_submit module=sender status=ok entity_type={} method={} source_record_id={source_record_id}",
                    self.entity_type,
                    payload.wire_method()
                );
                Some(LastReply::Line(line))
            }
            Err(err) => {
                warn!(
                    "event=entity_submit module=sender status=error entity_type={} method={} source_record_id={source_record_id} error_code={TRANSPORT_ERROR_CODE} error={err}",
                    self.entity_type,
                    payload.wire_method()
                );
                Some(LastReply::Unreachable(err.to_string()))
            }
        };
        Ok(())
    }

    fn last_response(&self) -> SendResult<RemoteResponse> {
        match &self.last_reply {
            None => Err(SendError::NoResponse),
            Some(LastReply::Line(line)) => decode_reply(line),
            Some(LastReply::Unreachable(message)) => Ok(RemoteResponse::Failure {
                detail: json!({"code": TRANSPORT_ERROR_CODE, "message": message}),
            }),
        }
    }
}

/// Encodes one submit request line.
pub fn encode_request(
    source_record_id: SourceRecordId,
    payload: &dyn EntityPayload,
) -> SendResult<String> {
    let request = json!({
        "method": payload.wire_method(),
        "params": payload.wire_params(source_record_id),
    });
    Ok(serde_json::to_string(&request)?)
}

/// Decodes one reply line into an explicit success/failure value.
pub fn decode_reply(line: &str) -> SendResult<RemoteResponse> {
    let envelope: Value = serde_json::from_str(line)
        .map_err(|err| SendError::MalformedResponse(format!("reply is not json: {err}")))?;
    let info = envelope
        .get("info")
        .filter(|value| value.is_object())
        .ok_or_else(|| SendError::MalformedResponse("missing `info` object".to_string()))?;
    let status = info
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| SendError::MalformedResponse("missing `info.status`".to_string()))?;

    if status != STATUS_SUCCESS {
        let detail = info.get("info").cloned().unwrap_or_else(|| info.clone());
        return Ok(RemoteResponse::Failure { detail });
    }

    let remote_id = info
        .get("info")
        .and_then(|rows| rows.get(0))
        .and_then(|row| row.get(0))
        .and_then(Value::as_i64)
        .ok_or_else(|| {
            SendError::MalformedResponse(
                "success reply lacks an integer id at `info.info[0][0]`".to_string(),
            )
        })?;
    Ok(RemoteResponse::Success { remote_id })
}
