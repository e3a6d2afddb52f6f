use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::coverage::CoverageError;
use crate::domain::registry::{RegistryError, ToolError};
use crate::domain::validation::ValidationError;
use crate::widgets::RenderError;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// Every way a JSON-RPC envelope can fail. Each variant maps onto exactly one
/// JSON-RPC error code, so callers that pattern-match on codes stay stable.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Parse error")]
    Parse,
    #[error("Invalid Request - {0}")]
    InvalidRequest(String),
    #[error("Method '{0}' not found")]
    MethodNotFound(String),
    #[error("Tool '{0}' not found")]
    ToolNotFound(String),
    #[error("Resource '{0}' not found")]
    ResourceNotFound(String),
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error("Invalid params: {0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Tool(#[from] ToolError),
    #[error("Failed to fetch widget: {0}")]
    TemplateFetch(RenderError),
    #[error("Failed to render widget: {0}")]
    Render(RenderError),
    #[error("Internal error")]
    Internal(String),
}

impl DispatchError {
    pub fn code(&self) -> i32 {
        match self {
            Self::Parse => PARSE_ERROR,
            Self::InvalidRequest(_) => INVALID_REQUEST,
            Self::MethodNotFound(_) | Self::ToolNotFound(_) | Self::ResourceNotFound(_) => {
                METHOD_NOT_FOUND
            }
            Self::InvalidParams(_) | Self::Validation(_) => INVALID_PARAMS,
            Self::Tool(ToolError::InvalidArguments(_)) => INVALID_PARAMS,
            Self::Tool(ToolError::BackendUnavailable(_)) => INTERNAL_ERROR,
            Self::TemplateFetch(_) | Self::Render(_) | Self::Internal(_) => INTERNAL_ERROR,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.code() == INTERNAL_ERROR
    }

    pub fn data(&self) -> Option<Value> {
        match self {
            Self::ToolNotFound(name) => Some(error_data(
                "tool_not_found",
                "unknown tool name",
                json!({ "name": name }),
            )),
            Self::ResourceNotFound(uri) => Some(error_data(
                "resource_not_found",
                "unknown resource uri",
                json!({ "uri": uri }),
            )),
            Self::Validation(err) => Some(error_data(
                "invalid_arguments",
                &err.to_string(),
                json!({ "field": err.field, "expected": err.expected }),
            )),
            Self::Tool(ToolError::InvalidArguments(message)) => Some(error_data(
                "invalid_arguments",
                message,
                json!({}),
            )),
            Self::Internal(detail) => Some(Value::String(detail.clone())),
            _ => None,
        }
    }
}

fn error_data(code: &str, message: &str, details: Value) -> Value {
    json!({
        "code": code,
        "message": message,
        "details": details,
    })
}

/// Errors of the plain HTTP surfaces (test harness, widget files) that are not
/// JSON-RPC envelopes.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("not found: {message}")]
    NotFound { code: &'static str, message: String },
    #[error("internal error")]
    Internal { code: &'static str, message: String },
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub error: String,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            code: "internal_error",
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, code, message),
            Self::Internal { code, message } => {
                tracing::error!(error = %message, "request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    code,
                    "internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                code: code.to_string(),
                error: message,
            }),
        )
            .into_response()
    }
}

/// Anything that aborts startup before a transport is running.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Coverage(#[from] CoverageError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_json_rpc_convention() {
        assert_eq!(DispatchError::Parse.code(), -32700);
        assert_eq!(
            DispatchError::InvalidRequest("bad".to_string()).code(),
            -32600
        );
        assert_eq!(DispatchError::MethodNotFound("x".to_string()).code(), -32601);
        assert_eq!(DispatchError::ToolNotFound("x".to_string()).code(), -32601);
        assert_eq!(DispatchError::InvalidParams("x".to_string()).code(), -32602);
        assert_eq!(DispatchError::Internal("boom".to_string()).code(), -32603);
        assert_eq!(
            DispatchError::Tool(ToolError::BackendUnavailable("down".to_string())).code(),
            -32603
        );
    }

    #[test]
    fn tool_not_found_message_names_the_tool() {
        let err = DispatchError::ToolNotFound("paint_door".to_string());
        assert_eq!(err.to_string(), "Tool 'paint_door' not found");
        assert_eq!(err.data().expect("data")["details"]["name"], "paint_door");
    }
}
