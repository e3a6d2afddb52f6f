//! Input validation of `tools/call` arguments against a tool's declared schema

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::registry::{FieldKind, InputSchema, ToolArgs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFailure {
    Missing,
    WrongKind,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("missing required"),
            Self::WrongKind => f.write_str("invalid"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{failure} field '{field}' (expected {expected})")]
pub struct ValidationError {
    pub field: String,
    pub expected: String,
    pub failure: ValidationFailure,
}

impl ValidationError {
    fn missing(field: &str, kind: FieldKind) -> Self {
        Self {
            field: field.to_string(),
            expected: kind.expected(),
            failure: ValidationFailure::Missing,
        }
    }

    fn wrong_kind(field: &str, expected: String) -> Self {
        Self {
            field: field.to_string(),
            expected,
            failure: ValidationFailure::WrongKind,
        }
    }
}

/// Checks `raw` against `schema` field by field, in declaration order, and
/// reports the first offending field. Extra fields are passed through.
pub fn validate(schema: &InputSchema, raw: Option<&Value>) -> Result<ToolArgs, ValidationError> {
    let mut args = match raw {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            return Err(ValidationError::wrong_kind(
                "arguments",
                "object".to_string(),
            ))
        }
    };

    for field in schema.fields {
        match args.get(field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    return Err(ValidationError::missing(field.name, field.kind));
                }
                args.remove(field.name);
            }
            Some(value) => {
                if !matches_kind(value, field.kind) {
                    return Err(ValidationError::wrong_kind(
                        field.name,
                        field.kind.expected(),
                    ));
                }
            }
        }
    }

    Ok(args)
}

fn matches_kind(value: &Value, kind: FieldKind) -> bool {
    match kind {
        FieldKind::String => value.is_string(),
        FieldKind::Number => value.is_number(),
        FieldKind::StringArray => value
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string)),
        FieldKind::Enum(members) => value
            .as_str()
            .is_some_and(|member| members.contains(&member)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::registry::FieldSpec;

    const FIELDS: &[FieldSpec] = &[
        FieldSpec::required("symptoms", FieldKind::StringArray, "Symptoms"),
        FieldSpec::required("location", FieldKind::String, "Location"),
        FieldSpec::optional("days", FieldKind::Number, "Days"),
        FieldSpec::optional(
            "door_type",
            FieldKind::Enum(&["single", "double"]),
            "Door type",
        ),
    ];

    const SCHEMA: InputSchema = InputSchema { fields: FIELDS };

    #[test]
    fn accepts_valid_arguments_and_keeps_extras() {
        let raw = json!({
            "symptoms": ["stuck"],
            "location": "Henderson",
            "days": 3,
            "door_type": "double",
            "note": "typed by the user"
        });

        let args = validate(&SCHEMA, Some(&raw)).expect("valid arguments");
        assert_eq!(args["location"], "Henderson");
        assert_eq!(args["note"], "typed by the user");
    }

    #[test]
    fn reports_first_missing_required_field() {
        let raw = json!({ "days": 3 });

        let err = validate(&SCHEMA, Some(&raw)).expect_err("missing fields");
        assert_eq!(err.field, "symptoms");
        assert_eq!(err.failure, ValidationFailure::Missing);
        assert_eq!(err.expected, "array of strings");
    }

    #[test]
    fn rejects_wrong_primitive_kind() {
        let raw = json!({ "symptoms": ["stuck", 4], "location": "Provo" });

        let err = validate(&SCHEMA, Some(&raw)).expect_err("mixed array");
        assert_eq!(err.field, "symptoms");
        assert_eq!(err.failure, ValidationFailure::WrongKind);
    }

    #[test]
    fn rejects_enum_non_member() {
        let raw = json!({ "symptoms": [], "location": "Provo", "door_type": "triple" });

        let err = validate(&SCHEMA, Some(&raw)).expect_err("bad enum");
        assert_eq!(err.field, "door_type");
        assert_eq!(err.expected, "one of: single, double");
        assert_eq!(
            err.to_string(),
            "invalid field 'door_type' (expected one of: single, double)"
        );
    }

    #[test]
    fn optional_null_is_dropped() {
        let raw = json!({ "symptoms": [], "location": "Provo", "days": null });

        let args = validate(&SCHEMA, Some(&raw)).expect("null optional");
        assert!(!args.contains_key("days"));
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let raw = json!("not-an-object");

        let err = validate(&SCHEMA, Some(&raw)).expect_err("string arguments");
        assert_eq!(err.field, "arguments");
        assert_eq!(err.expected, "object");
    }

    #[test]
    fn absent_arguments_fail_on_required_fields() {
        let err = validate(&SCHEMA, None).expect_err("no arguments");
        assert_eq!(err.field, "symptoms");
    }
}
