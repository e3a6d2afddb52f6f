use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::chat::{ChatError, ChatRequest};
use crate::errors::AppError;
use crate::AppState;

/// The key check comes first, so an unconfigured proxy answers 500 whatever
/// the body holds.
pub async fn chat_endpoint(State(state): State<AppState>, body: Bytes) -> Response {
    if !state.chat.is_configured() {
        return not_configured();
    }

    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => return AppError::bad_request("invalid_json", err.to_string()).into_response(),
    };

    match state.chat.complete(&request).await {
        Ok(reply) => {
            let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, Json(reply.body)).into_response()
        }
        Err(ChatError::NotConfigured) => not_configured(),
        Err(err) => {
            error!(error = %err, "chat proxy request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Chat request failed",
                    "message": err.to_string(),
                })),
            )
                .into_response()
        }
    }
}

fn not_configured() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "OpenAI API key not configured",
            "message": "Set OPENAI_API_KEY in the server environment",
        })),
    )
        .into_response()
}
