//! Output schema declaration and validation.
//!
//! A `FunctionSpec` declares the shape of the value a hollow function must
//! produce. The validator walks that declaration against the decoded payload,
//! coercing the stringified scalars models frequently emit (e.g. `"true"` for
//! a boolean field) and rejecting anything else.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::HollowError;

/// Type descriptor for a hollow function's output.
///
/// An explicit tagged tree walked recursively by `validate` - no reflection,
/// no derived JSON Schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputSchema {
    Boolean,
    Number,
    String,
    /// Closed set of accepted string values
    Enum { values: Vec<String> },
    /// Nested record; field order is stable for prompt rendering
    Record { fields: BTreeMap<String, OutputSchema> },
}

/// A single validation failure, reported for the first rule that breaks.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SchemaError {
    #[error("missing field '{0}'")]
    MissingField(String),

    #[error("field '{field}' type mismatch: expected {expected}, got {found}")]
    FieldTypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("value '{value}' is not one of the enum variants {allowed:?}")]
    NotInEnum {
        value: String,
        allowed: Vec<String>,
    },

    #[error("expected {expected}, got {found}")]
    TypeMismatch { expected: String, found: String },
}

impl From<SchemaError> for HollowError {
    fn from(err: SchemaError) -> Self {
        HollowError::SchemaViolation(err.to_string())
    }
}

impl OutputSchema {
    /// Convenience constructor for a record schema
    pub fn record(fields: impl IntoIterator<Item = (&'static str, OutputSchema)>) -> Self {
        Self::Record {
            fields: fields
                .into_iter()
                .map(|(name, schema)| (name.to_string(), schema))
                .collect(),
        }
    }

    /// Convenience constructor for an enum schema
    pub fn enumeration(values: impl IntoIterator<Item = &'static str>) -> Self {
        Self::Enum {
            values: values.into_iter().map(str::to_string).collect(),
        }
    }

    /// Human-readable name of this schema's kind, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Enum { .. } => "enum",
            Self::Record { .. } => "record",
        }
    }

    /// Validate a decoded payload against this schema.
    ///
    /// Returns the coerced, schema-conformant value on success: stringified
    /// booleans and numbers are normalized to their declared kind, so a
    /// `Success` result provably matches the declaration. Unknown extra
    /// fields in record payloads are ignored for forward compatibility.
    pub fn validate(&self, payload: &Value) -> Result<Value, SchemaError> {
        match self {
            Self::Boolean => coerce_boolean(payload).ok_or_else(|| SchemaError::TypeMismatch {
                expected: "boolean".into(),
                found: json_type_name(payload).into(),
            }),
            Self::Number => coerce_number(payload).ok_or_else(|| SchemaError::TypeMismatch {
                expected: "number".into(),
                found: json_type_name(payload).into(),
            }),
            Self::String => match payload {
                Value::String(s) => Ok(Value::String(s.clone())),
                other => Err(SchemaError::TypeMismatch {
                    expected: "string".into(),
                    found: json_type_name(other).into(),
                }),
            },
            Self::Enum { values } => match payload {
                Value::String(s) if values.contains(s) => Ok(Value::String(s.clone())),
                Value::String(s) => Err(SchemaError::NotInEnum {
                    value: s.clone(),
                    allowed: values.clone(),
                }),
                other => Err(SchemaError::TypeMismatch {
                    expected: "enum".into(),
                    found: json_type_name(other).into(),
                }),
            },
            Self::Record { fields } => {
                let object = payload.as_object().ok_or_else(|| SchemaError::TypeMismatch {
                    expected: "record".into(),
                    found: json_type_name(payload).into(),
                })?;

                let mut validated = serde_json::Map::new();
                for (name, field_schema) in fields {
                    let field_value = object
                        .get(name)
                        .ok_or_else(|| SchemaError::MissingField(name.clone()))?;

                    let coerced = field_schema.validate(field_value).map_err(|err| {
                        // Keep nested record errors precise; wrap scalar
                        // mismatches with the offending field name.
                        match err {
                            SchemaError::TypeMismatch { expected, found } => {
                                SchemaError::FieldTypeMismatch {
                                    field: name.clone(),
                                    expected,
                                    found,
                                }
                            }
                            other => other,
                        }
                    })?;
                    validated.insert(name.clone(), coerced);
                }

                Ok(Value::Object(validated))
            }
        }
    }

    /// Render a compact shape sketch of this schema for prompt instructions,
    /// e.g. `{"wordInSentence": <true|false>}`.
    pub fn shape_sketch(&self) -> String {
        match self {
            Self::Boolean => "<true|false>".to_string(),
            Self::Number => "<number>".to_string(),
            Self::String => "<string>".to_string(),
            Self::Enum { values } => {
                let rendered: Vec<String> =
                    values.iter().map(|v| format!("\"{}\"", v)).collect();
                format!("<{}>", rendered.join("|"))
            }
            Self::Record { fields } => {
                let rendered: Vec<String> = fields
                    .iter()
                    .map(|(name, schema)| format!("\"{}\": {}", name, schema.shape_sketch()))
                    .collect();
                format!("{{{}}}", rendered.join(", "))
            }
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Accept native booleans and the stringified forms models tend to emit
fn coerce_boolean(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(b) => Some(Value::Bool(*b)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

/// Accept native numbers and numeric strings
fn coerce_number(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) => Some(Value::Number(n.clone())),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Some(Value::from(i));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn boolean_accepts_stringified_values() {
        assert_eq!(
            OutputSchema::Boolean.validate(&json!("true")).unwrap(),
            json!(true)
        );
        assert_eq!(
            OutputSchema::Boolean.validate(&json!("False")).unwrap(),
            json!(false)
        );
        assert_eq!(
            OutputSchema::Boolean.validate(&json!(true)).unwrap(),
            json!(true)
        );
        assert!(OutputSchema::Boolean.validate(&json!("yes")).is_err());
    }

    #[test]
    fn number_accepts_numeric_strings() {
        assert_eq!(
            OutputSchema::Number.validate(&json!("42")).unwrap(),
            json!(42)
        );
        assert_eq!(
            OutputSchema::Number.validate(&json!(3.5)).unwrap(),
            json!(3.5)
        );
        assert!(OutputSchema::Number.validate(&json!("forty-two")).is_err());
    }

    #[test]
    fn enum_checks_membership() {
        let schema = OutputSchema::enumeration(["positive", "negative", "neutral"]);
        assert_eq!(
            schema.validate(&json!("neutral")).unwrap(),
            json!("neutral")
        );
        let err = schema.validate(&json!("mixed")).unwrap_err();
        assert!(matches!(err, SchemaError::NotInEnum { .. }));
    }

    #[test]
    fn record_coerces_fields_and_ignores_extras() {
        let schema = OutputSchema::record([("wordInSentence", OutputSchema::Boolean)]);
        let payload = json!({"wordInSentence": "true", "confidence": 0.9});
        assert_eq!(
            schema.validate(&payload).unwrap(),
            json!({"wordInSentence": true})
        );
    }

    #[test]
    fn record_reports_missing_field() {
        let schema = OutputSchema::record([("sentiment", OutputSchema::String)]);
        let err = schema.validate(&json!({})).unwrap_err();
        assert_eq!(err, SchemaError::MissingField("sentiment".into()));
    }

    #[test]
    fn record_reports_field_type_mismatch() {
        let schema = OutputSchema::record([("count", OutputSchema::Number)]);
        let err = schema.validate(&json!({"count": [1, 2]})).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::FieldTypeMismatch { ref field, .. } if field == "count"
        ));
    }

    #[test]
    fn nested_records_validate_recursively() {
        let schema = OutputSchema::record([(
            "verdict",
            OutputSchema::record([("guilty", OutputSchema::Boolean)]),
        )]);
        let coerced = schema
            .validate(&json!({"verdict": {"guilty": "false"}}))
            .unwrap();
        assert_eq!(coerced, json!({"verdict": {"guilty": false}}));
    }

    #[test]
    fn shape_sketch_renders_records() {
        let schema = OutputSchema::record([("wordInSentence", OutputSchema::Boolean)]);
        assert_eq!(schema.shape_sketch(), r#"{"wordInSentence": <true|false>}"#);
    }
}
