//! Axum HTTP handlers for the web server
//!
//! Provides the Model Context Protocol endpoint, the widget file route, and
//! the general metadata endpoints.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;

use crate::errors::AppError;
use crate::mcp::rpc::RpcReply;
use crate::mcp::server::handle_json_rpc_bytes;
use crate::widgets::embedded_html;
use crate::AppState;

pub const SERVER_NAME: &str = "A Plus Garage Door MCP Server";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub tools: Vec<&'static str>,
    pub mcp_endpoint: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub mcp_endpoint: &'static str,
}

#[derive(Debug, Serialize)]
pub struct McpDescriptor {
    pub name: &'static str,
    pub version: &'static str,
    pub protocol: &'static str,
    pub usage: &'static str,
    pub tools: Vec<&'static str>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        tools: state.registry.names(),
        mcp_endpoint: "/mcp",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

pub async fn discovery() -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        mcp_endpoint: "/mcp",
    })
}

pub async fn mcp_descriptor(State(state): State<AppState>) -> Json<McpDescriptor> {
    Json(McpDescriptor {
        name: SERVER_NAME,
        version: env!("CARGO_PKG_VERSION"),
        protocol: "MCP (Model Context Protocol)",
        usage: r#"POST with {"method": "tools/list"} or {"method": "tools/call", "params": {...}}"#,
        tools: state.registry.names(),
    })
}

pub async fn mcp_endpoint(State(state): State<AppState>, body: Bytes) -> Response {
    match handle_json_rpc_bytes(&state, &body).await {
        RpcReply::Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        RpcReply::Rejected(response) => (StatusCode::BAD_REQUEST, Json(response)).into_response(),
        RpcReply::Batch(responses) => (StatusCode::OK, Json(responses)).into_response(),
        RpcReply::Accepted => StatusCode::ACCEPTED.into_response(),
    }
}

pub async fn widget_file(Path(file): Path<String>) -> Result<Html<&'static str>, AppError> {
    embedded_html(&file)
        .map(Html)
        .ok_or_else(|| AppError::not_found("widget_not_found", format!("unknown widget '{file}'")))
}

pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
        .into_response()
}
