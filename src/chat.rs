//! Chat-completion proxy
//!
//! Forwards a caller's chat request to an OpenAI-compatible upstream with the
//! server-side API key, so browser demos never see the key.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("OpenAI API key not configured")]
    NotConfigured,
    #[error("{0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Value,
    #[serde(default)]
    pub tools: Option<Value>,
    #[serde(default)]
    pub tool_choice: Option<Value>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpstreamRequest<'a> {
    model: &'a str,
    messages: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a Value>,
}

/// Upstream status and JSON body, passed back to the caller unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub status: u16,
    pub body: Value,
}

#[derive(Debug, Clone)]
pub struct ChatProxy {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    default_model: String,
}

impl ChatProxy {
    pub fn new(
        client: reqwest::Client,
        api_key: Option<String>,
        base_url: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.into(),
            default_model: default_model.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        let api_key = self.api_key.as_deref().ok_or(ChatError::NotConfigured)?;

        let body = UpstreamRequest {
            model: request.model.as_deref().unwrap_or(&self.default_model),
            messages: &request.messages,
            tools: request.tools.as_ref(),
            tool_choice: request.tool_choice.as_ref(),
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.json::<Value>().await?;
        if !(200..300).contains(&status) {
            tracing::error!(status, body = %body, "chat upstream returned an error");
        }

        Ok(ChatReply { status, body })
    }
}
