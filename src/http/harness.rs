//! Local tool test harness at `/test-tool`
//!
//! Runs a tool through the same registry, validator and handler as
//! `tools/call`, and returns the bare structured result without an RPC
//! envelope or widget.

use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::registry::ToolError;
use crate::domain::tools::invoke_tool;
use crate::errors::{AppError, DispatchError};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HarnessUsage {
    pub info: &'static str,
    pub usage: &'static str,
    pub available_tools: Vec<&'static str>,
}

/// `params` carries the tool arguments. When it is absent, the remaining
/// top-level fields are used instead.
#[derive(Debug, Deserialize)]
pub struct HarnessRequest {
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(flatten)]
    pub inline: Map<String, Value>,
}

pub async fn usage(State(state): State<AppState>) -> Json<HarnessUsage> {
    Json(HarnessUsage {
        info: "Test tool endpoint for demo",
        usage: r#"POST with {"tool": "tool_name", "params": {...}}"#,
        available_tools: state.registry.names(),
    })
}

pub async fn run_tool(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, AppError> {
    let request: HarnessRequest = serde_json::from_slice(&body)
        .map_err(|err| AppError::bad_request("invalid_json", err.to_string()))?;

    let tool = request
        .tool
        .filter(|tool| !tool.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("missing_tool", "Missing tool name"))?;
    let arguments = request.params.unwrap_or(Value::Object(request.inline));

    invoke_tool(&state, &tool, Some(&arguments))
        .map(Json)
        .map_err(harness_error)
}

fn harness_error(err: DispatchError) -> AppError {
    match err {
        DispatchError::ToolNotFound(_) => AppError::not_found("tool_not_found", err.to_string()),
        DispatchError::Validation(_)
        | DispatchError::InvalidParams(_)
        | DispatchError::Tool(ToolError::InvalidArguments(_)) => {
            AppError::bad_request("invalid_arguments", err.to_string())
        }
        other => AppError::internal(other.to_string()),
    }
}
