//! The central Model Context Protocol engine
//!
//! Decodes raw payloads (single envelopes and batches), routes methods,
//! negotiates the protocol version on `initialize` and writes the audit log.
//! Both the HTTP and the stdio transport call into this module.

use rust_mcp_sdk::schema::{
    Implementation, InitializeResult, ServerCapabilities, ServerCapabilitiesResources,
    ServerCapabilitiesTools,
};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::domain::{
    resources::{handle_resources_list, handle_resources_read},
    tools::handle_tools_call,
};
use crate::errors::DispatchError;
use crate::mcp::rpc::{RpcEnvelope, RpcReply, RpcResponse, INITIALIZED_NOTIFICATION};
use crate::AppState;

pub const DEFAULT_PROTOCOL_VERSION: &str = "2025-03-26";
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

const REDACTED_KEYS: &[&str] = &["phone", "customer_name", "address"];

pub async fn handle_json_rpc_bytes(state: &AppState, raw: &[u8]) -> RpcReply {
    match serde_json::from_slice::<Value>(raw) {
        Ok(payload) => handle_json_rpc_value(state, payload).await,
        Err(_) => RpcReply::Rejected(RpcResponse::failure(Value::Null, &DispatchError::Parse)),
    }
}

pub async fn handle_json_rpc_value(state: &AppState, payload: Value) -> RpcReply {
    match payload {
        Value::Array(items) => handle_batch(state, items).await,
        payload => handle_envelope(state, payload).await,
    }
}

async fn handle_batch(state: &AppState, items: Vec<Value>) -> RpcReply {
    if items.is_empty() {
        return RpcReply::Rejected(RpcResponse::failure(
            Value::Null,
            &DispatchError::InvalidRequest("empty batch".to_string()),
        ));
    }

    let mut responses = Vec::with_capacity(items.len());
    for item in items {
        match handle_envelope(state, item).await {
            RpcReply::Ok(response) | RpcReply::Rejected(response) => responses.push(response),
            RpcReply::Batch(nested) => responses.extend(nested),
            RpcReply::Accepted => {}
        }
    }

    if responses.is_empty() {
        RpcReply::Accepted
    } else {
        RpcReply::Batch(responses)
    }
}

async fn handle_envelope(state: &AppState, payload: Value) -> RpcReply {
    let envelope = match RpcEnvelope::parse(payload) {
        Ok(envelope) => envelope,
        Err(rejection) => {
            return RpcReply::Rejected(RpcResponse::failure(rejection.id, &rejection.error))
        }
    };

    if envelope.is_notification() {
        info!(method = %envelope.method, "mcp notification accepted");
        if envelope.method != INITIALIZED_NOTIFICATION {
            // Notifications run like requests; only the reply is dropped.
            if let Err(err) =
                handle_json_rpc_request(state, &envelope.method, envelope.params.as_ref()).await
            {
                debug!(method = %envelope.method, error = %err, "mcp notification failed");
            }
        }
        return RpcReply::Accepted;
    }

    let id = envelope.id_value();
    let audit_params = redact_audit_params(envelope.params.as_ref());
    let response = match handle_json_rpc_request(state, &envelope.method, envelope.params.as_ref())
        .await
    {
        Ok(result) => RpcResponse::success(id, result),
        Err(err) => RpcResponse::failure(id, &err),
    };

    info!(
        method = %envelope.method,
        params = %audit_params,
        outcome = if response.is_error() { "failure" } else { "success" },
        "mcp action audited"
    );

    RpcReply::Ok(response)
}

pub async fn handle_json_rpc_request(
    state: &AppState,
    method: &str,
    params: Option<&Value>,
) -> Result<Value, DispatchError> {
    match method {
        "initialize" => initialize_result(params),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(tools_list(state)),
        "tools/call" => handle_tools_call(state, params).await,
        "resources/list" => handle_resources_list(state),
        "resources/read" => handle_resources_read(state, params).await,
        _ => Err(DispatchError::MethodNotFound(method.to_string())),
    }
}

fn initialize_result(params: Option<&Value>) -> Result<Value, DispatchError> {
    let initialize_result = InitializeResult {
        server_info: Implementation {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: Some("A Plus Garage Door".to_string()),
            description: None,
            icons: vec![],
            website_url: None,
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools {
                list_changed: Some(false),
            }),
            resources: Some(ServerCapabilitiesResources {
                subscribe: Some(false),
                list_changed: Some(false),
            }),
            prompts: None,
            ..Default::default()
        },
        protocol_version: negotiate_protocol_version(params).to_string(),
        instructions: None,
        meta: None,
    };

    serde_json::to_value(initialize_result).map_err(|err| DispatchError::Internal(err.to_string()))
}

fn tools_list(state: &AppState) -> Value {
    let tools = state
        .registry
        .list()
        .iter()
        .map(|tool| tool.to_listing(&state.renderer.uri(&tool.template)))
        .collect::<Vec<_>>();
    json!({ "tools": tools })
}

/// The client's offered version when we speak it, our default otherwise.
pub fn negotiate_protocol_version(params: Option<&Value>) -> &'static str {
    params
        .and_then(|params| params.get("protocolVersion"))
        .and_then(Value::as_str)
        .map(str::trim)
        .and_then(|offered| {
            SUPPORTED_PROTOCOL_VERSIONS
                .iter()
                .find(|supported| **supported == offered)
                .copied()
        })
        .unwrap_or(DEFAULT_PROTOCOL_VERSION)
}

pub fn redact_audit_params(params: Option<&Value>) -> Value {
    params.map(redact_audit_value).unwrap_or(Value::Null)
}

pub fn redact_audit_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    if is_personal_key(key) {
                        (key.clone(), Value::String("[REDACTED]".to_string()))
                    } else {
                        (key.clone(), redact_audit_value(item))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_audit_value).collect()),
        _ => value.clone(),
    }
}

pub fn is_personal_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase();
    REDACTED_KEYS.contains(&normalized.as_str())
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use async_trait::async_trait;
    use serde_json::json;

    use super::{
        handle_json_rpc_bytes, negotiate_protocol_version, redact_audit_params,
        DEFAULT_PROTOCOL_VERSION,
    };
    use crate::mcp::rpc::RpcReply;
    use crate::widgets::{
        EmbeddedTemplateSource, RenderError, TemplateSource, WidgetRenderer, WidgetTemplate,
    };
    use crate::AppState;

    #[derive(Default)]
    struct CountingSource {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl TemplateSource for CountingSource {
        fn uri(&self, template: &WidgetTemplate) -> String {
            EmbeddedTemplateSource.uri(template)
        }

        async fn fetch(&self, template: &WidgetTemplate) -> Result<String, RenderError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            EmbeddedTemplateSource.fetch(template).await
        }
    }

    #[tokio::test]
    async fn tool_call_without_id_runs_but_is_not_answered() {
        let source = Arc::new(CountingSource::default());
        let state = AppState::with_renderer(WidgetRenderer::new(source.clone()));

        let reply = handle_json_rpc_bytes(
            &state,
            br#"{"jsonrpc":"2.0","method":"tools/call","params":{"name":"get_promotions","arguments":{}}}"#,
        )
        .await;
        assert!(matches!(reply, RpcReply::Accepted));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

        let reply = handle_json_rpc_bytes(
            &state,
            br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        )
        .await;
        assert!(matches!(reply, RpcReply::Accepted));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn redacts_personal_fields_in_audit_params() {
        let params = json!({
            "name": "create_service_request",
            "arguments": {
                "service_type": "maintenance",
                "customer_name": "should-not-appear",
                "Phone": "should-not-appear",
                "nested": {
                    "address": "should-not-appear"
                }
            }
        });

        let redacted = redact_audit_params(Some(&params));

        assert_eq!(redacted["name"], json!("create_service_request"));
        assert_eq!(redacted["arguments"]["service_type"], json!("maintenance"));
        assert_eq!(redacted["arguments"]["customer_name"], json!("[REDACTED]"));
        assert_eq!(redacted["arguments"]["Phone"], json!("[REDACTED]"));
        assert_eq!(
            redacted["arguments"]["nested"]["address"],
            json!("[REDACTED]")
        );
    }

    #[test]
    fn negotiate_protocol_version_echoes_supported_offer() {
        let params = json!({ "protocolVersion": "2024-11-05" });
        assert_eq!(negotiate_protocol_version(Some(&params)), "2024-11-05");
    }

    #[test]
    fn negotiate_protocol_version_falls_back_to_default() {
        let params = json!({ "protocolVersion": "2099-01-01" });
        assert_eq!(
            negotiate_protocol_version(Some(&params)),
            DEFAULT_PROTOCOL_VERSION
        );
        assert_eq!(negotiate_protocol_version(None), DEFAULT_PROTOCOL_VERSION);
    }
}
