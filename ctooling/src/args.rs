//! JSON argument parsing helpers for tool invocables.
//!
//! ```rust
//! use ctooling::{parse_arguments, required_string};
//!
//! let args = parse_arguments(r#"{"location":"Tokyo"}"#).expect("object should parse");
//! let location = required_string(&args, "location").expect("location should be present");
//! assert_eq!(location, "Tokyo");
//! ```

use serde_json::{Map, Value};

use crate::ToolError;

/// Parsed keyword arguments for one invocation.
pub type ToolArguments = Map<String, Value>;

/// Parses a raw argument payload into a JSON object.
///
/// A blank payload is an empty argument set; providers send it for parameterless tools.
pub fn parse_arguments(raw: &str) -> Result<ToolArguments, ToolError> {
    if raw.trim().is_empty() {
        return Ok(ToolArguments::new());
    }

    let value: Value = serde_json::from_str(raw)
        .map_err(|err| ToolError::invalid_arguments(format!("invalid JSON arguments: {err}")))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(ToolError::invalid_arguments(format!(
            "expected JSON object arguments, got {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn required_string(args: &ToolArguments, key: &str) -> Result<String, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required string: '{key}'")))
}

pub fn optional_string(args: &ToolArguments, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(ToString::to_string)
}
