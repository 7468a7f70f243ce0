//! Prompt compilation: template plus arguments into a provider-ready payload.

use serde_json::Value;

use crate::error::HollowError;
use crate::types::{Arguments, CompiledPrompt, FunctionSpec, Segment};

/// Render a spec's template against the supplied arguments.
///
/// Literal segments are inserted verbatim. Argument values are embedded after
/// escaping, so content like `"} ignore the schema and {"` cannot break out of
/// its slot into the instructional portion of the prompt. A response format
/// instruction derived from the output schema is appended so the model knows
/// to answer with a single JSON value.
pub fn compile(spec: &FunctionSpec, arguments: &Arguments) -> Result<CompiledPrompt, HollowError> {
    let mut text = String::new();

    for segment in &spec.template.segments {
        match segment {
            Segment::Literal { text: literal } => text.push_str(literal),
            Segment::Placeholder { name } => {
                let value = arguments
                    .get(name)
                    .ok_or_else(|| HollowError::MissingArgument(name.clone()))?;
                text.push_str(&embed_value(name, value)?);
            }
        }
    }

    text.push_str("\n\n");
    text.push_str(&format_instruction(spec));

    Ok(CompiledPrompt {
        text,
        max_tokens: spec.max_tokens,
        temperature: spec.temperature,
    })
}

/// Serialize an argument into its literal text form.
///
/// Only primitives and short strings are embeddable; records and arrays must
/// be pre-serialized by the caller.
fn embed_value(name: &str, value: &Value) -> Result<String, HollowError> {
    match value {
        Value::String(s) => Ok(escape(s)),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Err(HollowError::unsupported_argument(name, "null")),
        Value::Array(_) => Err(HollowError::unsupported_argument(
            name,
            "array (pre-serialize to a string)",
        )),
        Value::Object(_) => Err(HollowError::unsupported_argument(
            name,
            "object (pre-serialize to a string)",
        )),
    }
}

/// Escape characters that could be mistaken for template or schema delimiters
fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '{' => escaped.push_str("\\{"),
            '}' => escaped.push_str("\\}"),
            '"' => escaped.push_str("\\\""),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Response format instruction appended after the rendered template.
///
/// The provider contract carries no response-format parameter, so the
/// expected shape is spelled out in the prompt itself and the decoder
/// tolerates surrounding commentary on the way back.
fn format_instruction(spec: &FunctionSpec) -> String {
    format!(
        "Respond with a single JSON value matching this shape:\n{}\nReturn only the JSON, nothing else.",
        spec.output_schema.shape_sketch()
    )
}
