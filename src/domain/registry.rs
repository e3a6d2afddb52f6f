//! Tool descriptors and the startup-built registry that holds them
//!
//! The registry is assembled once in `domain::tools::build_registry` and shared
//! read-only behind an `Arc` by every transport.

use std::fmt;

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::domain::context::ToolContext;
use crate::errors::DispatchError;
use crate::widgets::WidgetTemplate;

/// Validated tool arguments, still in their JSON object form.
pub type ToolArgs = Map<String, Value>;

pub type ToolHandler = fn(&ToolContext<'_>, ToolArgs) -> Result<Value, ToolError>;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid params: {0}")]
    InvalidArguments(String),
    #[error("{0}")]
    BackendUnavailable(String),
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidArguments(err.to_string())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    StringArray,
    Enum(&'static [&'static str]),
}

impl FieldKind {
    pub fn expected(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Number => "number".to_string(),
            Self::StringArray => "array of strings".to_string(),
            Self::Enum(values) => format!("one of: {}", values.join(", ")),
        }
    }

    fn json_schema(&self) -> Map<String, Value> {
        let schema = match self {
            Self::String => json!({ "type": "string" }),
            Self::Number => json!({ "type": "number" }),
            Self::StringArray => json!({ "type": "array", "items": { "type": "string" } }),
            Self::Enum(values) => json!({ "type": "string", "enum": values }),
        };
        match schema {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub description: &'static str,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
        }
    }
}

/// Declarative argument shape of a tool, interpreted by the input validator
/// and translated into JSON schema for discovery.
#[derive(Debug, Clone, Copy)]
pub struct InputSchema {
    pub fields: &'static [FieldSpec],
}

impl InputSchema {
    pub fn to_json_schema(&self) -> Value {
        let properties = self
            .fields
            .iter()
            .map(|field| {
                let mut property = field.kind.json_schema();
                property.insert(
                    "description".to_string(),
                    Value::String(field.description.to_string()),
                );
                (field.name.to_string(), Value::Object(property))
            })
            .collect::<Map<_, _>>();
        let required = self
            .fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name)
            .collect::<Vec<_>>();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

#[derive(Clone, Copy)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub input_schema: InputSchema,
    pub handler: ToolHandler,
    pub template: WidgetTemplate,
    pub invoking: &'static str,
    pub invoked: &'static str,
    /// Extra boolean `_meta` hints, e.g. `openai/confirmationRequired`.
    pub hints: &'static [(&'static str, bool)],
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

impl ToolDescriptor {
    /// External `tools/list` shape, including the widget hints read by the
    /// presentation layer.
    pub fn to_listing(&self, template_uri: &str) -> Value {
        let mut listing = json!({
            "name": self.name,
            "title": self.title,
            "description": self.description,
            "inputSchema": self.input_schema.to_json_schema(),
            "_meta": {
                "openai/outputTemplate": template_uri,
                "openai/widgetAccessible": true,
                "openai/toolInvocation/invoking": self.invoking,
                "openai/toolInvocation/invoked": self.invoked,
            },
        });
        if let Some(meta) = listing.get_mut("_meta").and_then(Value::as_object_mut) {
            for (key, value) in self.hints {
                meta.insert((*key).to_string(), Value::Bool(*value));
            }
        }
        listing
    }
}

#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<(), RegistryError> {
        if self.tools.iter().any(|tool| tool.name == descriptor.name) {
            return Err(RegistryError::DuplicateTool(descriptor.name));
        }
        self.tools.push(descriptor);
        Ok(())
    }

    pub fn list(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Result<&ToolDescriptor, DispatchError> {
        self.tools
            .iter()
            .find(|tool| tool.name == name)
            .ok_or_else(|| DispatchError::ToolNotFound(name.to_string()))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|tool| tool.name).collect()
    }

    /// Distinct widget templates in first-use order.
    pub fn templates(&self) -> Vec<WidgetTemplate> {
        let mut templates: Vec<WidgetTemplate> = Vec::new();
        for tool in &self.tools {
            if !templates.contains(&tool.template) {
                templates.push(tool.template);
            }
        }
        templates
    }
}
