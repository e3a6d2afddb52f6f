//! Model Context Protocol resource providers
//!
//! Every distinct widget template of the registry is exposed as one
//! `text/html+skybridge` resource, addressed by the URI its template source
//! advertises.

use rust_mcp_sdk::schema::{
    ListResourcesResult, ReadResourceContent, ReadResourceResult, Resource, TextResourceContents,
};
use serde_json::Value;

use crate::errors::DispatchError;
use crate::widgets::{WidgetTemplate, RESOURCE_MIME_TYPE, WIDGET_MIME_TYPE};
use crate::AppState;

pub fn handle_resources_list(state: &AppState) -> Result<Value, DispatchError> {
    let resources = state
        .registry
        .templates()
        .into_iter()
        .map(|template| Resource {
            annotations: None,
            description: None,
            icons: vec![],
            meta: None,
            mime_type: Some(RESOURCE_MIME_TYPE.to_string()),
            name: template.name.to_string(),
            size: None,
            title: None,
            uri: state.renderer.uri(&template),
        })
        .collect();

    serde_json::to_value(ListResourcesResult {
        meta: None,
        next_cursor: None,
        resources,
    })
    .map_err(|err| DispatchError::Internal(err.to_string()))
}

pub async fn handle_resources_read(
    state: &AppState,
    params: Option<&Value>,
) -> Result<Value, DispatchError> {
    let uri = params
        .and_then(|params| params.get("uri"))
        .and_then(Value::as_str)
        .filter(|uri| !uri.is_empty())
        .ok_or_else(|| DispatchError::InvalidParams("uri required".to_string()))?;

    let template = find_template(state, uri)
        .ok_or_else(|| DispatchError::ResourceNotFound(uri.to_string()))?;
    let text = state
        .renderer
        .fetch(&template)
        .await
        .map_err(DispatchError::TemplateFetch)?;

    serde_json::to_value(ReadResourceResult {
        contents: vec![ReadResourceContent::from(TextResourceContents {
            meta: None,
            mime_type: Some(WIDGET_MIME_TYPE.to_string()),
            text,
            uri: uri.to_string(),
        })],
        meta: None,
    })
    .map_err(|err| DispatchError::Internal(err.to_string()))
}

fn find_template(state: &AppState, uri: &str) -> Option<WidgetTemplate> {
    state
        .registry
        .templates()
        .into_iter()
        .find(|template| state.renderer.uri(template) == uri)
}
