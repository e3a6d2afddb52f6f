//! The six assistant tools and the `tools/call` pipeline
//!
//! Each submodule owns one descriptor (name, schema, widget template) and the
//! pure handler behind it. `build_registry` is the only place tools are wired up;
//! `invoke_tool` is the only place a handler is run.

pub mod availability;
pub mod booking;
pub mod diagnosis;
pub mod door_styles;
pub mod promotions;
pub mod service_area;

use chrono::Utc;
use rust_mcp_sdk::schema::{CallToolResult, ContentBlock, TextContent};
use serde_json::{json, Value};

use crate::domain::context::ToolContext;
use crate::domain::registry::{RegistryError, ToolRegistry};
use crate::domain::validation::validate;
use crate::errors::DispatchError;
use crate::AppState;

pub fn build_registry() -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    for descriptor in [
        service_area::DESCRIPTOR,
        diagnosis::DESCRIPTOR,
        promotions::DESCRIPTOR,
        availability::DESCRIPTOR,
        door_styles::DESCRIPTOR,
        booking::DESCRIPTOR,
    ] {
        registry.register(descriptor)?;
    }
    Ok(registry)
}

/// Registry lookup, argument validation and the handler run, shared by every
/// transport. Returns the structured result without any widget.
pub fn invoke_tool(
    state: &AppState,
    name: &str,
    arguments: Option<&Value>,
) -> Result<Value, DispatchError> {
    let descriptor = state.registry.find(name)?;
    let args = validate(&descriptor.input_schema, arguments)?;
    let ctx = ToolContext::new(&state.coverage, &state.contacts, state.backend, Utc::now());
    Ok((descriptor.handler)(&ctx, args)?)
}

pub async fn handle_tools_call(
    state: &AppState,
    params: Option<&Value>,
) -> Result<Value, DispatchError> {
    let params = params
        .and_then(Value::as_object)
        .ok_or_else(|| DispatchError::InvalidParams("params must be an object".to_string()))?;
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| DispatchError::InvalidParams("name required".to_string()))?;

    let result = invoke_tool(state, name, params.get("arguments"))?;
    let template = state.registry.find(name)?.template;
    let widget = state
        .renderer
        .render(&template, &result)
        .await
        .map_err(DispatchError::Render)?;

    let mut response = serde_json::to_value(CallToolResult {
        content: vec![ContentBlock::from(TextContent::new(
            format!("Tool {name} executed successfully"),
            None,
            None,
        ))],
        is_error: None,
        meta: None,
        structured_content: result.as_object().cloned(),
    })
    .map_err(|err| DispatchError::Internal(err.to_string()))?;

    if let Some(content) = response.get_mut("content").and_then(Value::as_array_mut) {
        content.push(json!({
            "type": "resource",
            "resource": {
                "uri": widget.uri,
                "mimeType": widget.mime_type,
                "text": widget.html,
            },
        }));
    }

    Ok(response)
}
