//! JSON-RPC envelope parsing and response formatting
//!
//! Every reply, success or failure, is built here. Failures go through
//! [`RpcResponse::failure`] only, which maps a [`DispatchError`] onto its code,
//! message and data.

use serde::Serialize;
use serde_json::{Number, Value};
use tracing::error;

use crate::errors::DispatchError;

pub const JSONRPC_VERSION: &str = "2.0";
pub const INITIALIZED_NOTIFICATION: &str = "notifications/initialized";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcId {
    String(String),
    Number(Number),
}

impl RpcId {
    pub fn to_value(&self) -> Value {
        match self {
            Self::String(value) => Value::String(value.clone()),
            Self::Number(value) => Value::Number(value.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RpcEnvelope {
    pub method: String,
    pub params: Option<Value>,
    pub id: Option<RpcId>,
}

/// An envelope that failed before it could be routed. `id` is whatever could
/// be recovered from the request, `null` otherwise.
#[derive(Debug)]
pub struct EnvelopeRejection {
    pub id: Value,
    pub error: DispatchError,
}

impl EnvelopeRejection {
    fn new(id: Value, reason: &str) -> Self {
        Self {
            id,
            error: DispatchError::InvalidRequest(reason.to_string()),
        }
    }
}

impl RpcEnvelope {
    pub fn parse(payload: Value) -> Result<Self, EnvelopeRejection> {
        let Value::Object(mut object) = payload else {
            return Err(EnvelopeRejection::new(
                Value::Null,
                "request must be a JSON object",
            ));
        };

        let id = match object.remove("id") {
            None | Some(Value::Null) => None,
            Some(Value::String(value)) => Some(RpcId::String(value)),
            Some(Value::Number(value)) => Some(RpcId::Number(value)),
            Some(_) => {
                return Err(EnvelopeRejection::new(
                    Value::Null,
                    "id must be a string or number",
                ))
            }
        };
        let echoed_id = id.as_ref().map_or(Value::Null, RpcId::to_value);

        if object.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return Err(EnvelopeRejection::new(echoed_id, "must use JSON-RPC 2.0"));
        }

        let method = match object.remove("method") {
            Some(Value::String(method)) if !method.trim().is_empty() => method,
            _ => return Err(EnvelopeRejection::new(echoed_id, "method is required")),
        };

        Ok(Self {
            method,
            params: object.remove("params"),
            id,
        })
    }

    /// Requests without an id, plus the `initialized` notification however it
    /// arrives, are accepted and never answered.
    pub fn is_notification(&self) -> bool {
        self.id.is_none() || self.method == INITIALIZED_NOTIFICATION
    }

    pub fn id_value(&self) -> Value {
        self.id.as_ref().map_or(Value::Null, RpcId::to_value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcPayload {
    Result(Value),
    Error(RpcErrorObject),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(flatten)]
    pub payload: RpcPayload,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            payload: RpcPayload::Result(result),
        }
    }

    pub fn failure(id: Value, err: &DispatchError) -> Self {
        if err.is_internal() {
            error!(error = %err, data = ?err.data(), "mcp request failed with internal error");
        }

        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            payload: RpcPayload::Error(RpcErrorObject {
                code: err.code(),
                message: err.to_string(),
                data: err.data(),
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.payload, RpcPayload::Error(_))
    }
}

/// Outcome of dispatching one inbound payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcReply {
    Ok(RpcResponse),
    /// Envelope-level failure; the HTTP transport answers 400.
    Rejected(RpcResponse),
    Batch(Vec<RpcResponse>),
    /// Notification: no body at all.
    Accepted,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::errors::INVALID_REQUEST;

    #[test]
    fn parses_request_with_numeric_id() {
        let envelope = RpcEnvelope::parse(json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/list",
        }))
        .expect("valid envelope");

        assert_eq!(envelope.method, "tools/list");
        assert_eq!(envelope.id_value(), json!(7));
        assert!(envelope.params.is_none());
        assert!(!envelope.is_notification());
    }

    #[test]
    fn missing_or_null_id_is_a_notification() {
        for payload in [
            json!({ "jsonrpc": "2.0", "method": "tools/list" }),
            json!({ "jsonrpc": "2.0", "method": "tools/list", "id": null }),
            json!({ "jsonrpc": "2.0", "method": "notifications/initialized", "id": 1 }),
        ] {
            let envelope = RpcEnvelope::parse(payload).expect("valid envelope");
            assert!(envelope.is_notification());
        }
    }

    #[test]
    fn wrong_version_echoes_id() {
        let rejection = RpcEnvelope::parse(json!({
            "jsonrpc": "1.0",
            "id": "abc",
            "method": "ping",
        }))
        .expect_err("must reject");

        assert_eq!(rejection.id, json!("abc"));
        assert_eq!(rejection.error.code(), INVALID_REQUEST);
        assert_eq!(
            rejection.error.to_string(),
            "Invalid Request - must use JSON-RPC 2.0"
        );
    }

    #[test]
    fn malformed_id_and_non_objects_answer_with_null_id() {
        for payload in [
            json!([1, 2]),
            json!("ping"),
            json!({ "jsonrpc": "2.0", "id": { "nested": true }, "method": "ping" }),
        ] {
            let rejection = RpcEnvelope::parse(payload).expect_err("must reject");
            assert_eq!(rejection.id, Value::Null);
            assert_eq!(rejection.error.code(), INVALID_REQUEST);
        }
    }

    #[test]
    fn blank_method_is_rejected() {
        let rejection = RpcEnvelope::parse(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "   ",
        }))
        .expect_err("must reject");
        assert_eq!(rejection.id, json!(1));
    }

    #[test]
    fn responses_carry_exactly_one_of_result_or_error() {
        let ok = serde_json::to_value(RpcResponse::success(json!(1), json!({}))).expect("serialize");
        assert_eq!(ok, json!({ "jsonrpc": "2.0", "id": 1, "result": {} }));

        let failed = serde_json::to_value(RpcResponse::failure(
            json!(2),
            &DispatchError::MethodNotFound("nope".to_string()),
        ))
        .expect("serialize");
        assert_eq!(
            failed,
            json!({
                "jsonrpc": "2.0",
                "id": 2,
                "error": { "code": -32601, "message": "Method 'nope' not found" },
            })
        );
    }
}
