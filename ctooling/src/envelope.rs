//! Normalized tool results and their routing flags.
//!
//! ```rust
//! use ctooling::{ToolOutput, ToolResultEnvelope};
//! use serde_json::json;
//!
//! let direct = ToolResultEnvelope::with_content("10C").send_directly();
//! assert!(direct.send_directly_to_user);
//!
//! let mapped = ToolOutput::from(json!({"content": "10C", "use_secondary_model": true}))
//!     .into_envelope()
//!     .expect("mapping should normalize")
//!     .expect("mapping has content");
//! assert_eq!(mapped.content.as_deref(), Some("10C"));
//! assert!(mapped.use_secondary_model);
//! assert!(!mapped.send_directly_to_user);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ToolError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolResultEnvelope {
    pub content: Option<String>,
    pub send_directly_to_user: bool,
    pub post_content: Option<String>,
    pub stream_data: Option<Map<String, Value>>,
    pub use_secondary_model: bool,
    pub force_no_functions: bool,
    /// Carried through unchanged; no summarizer consumes it yet.
    pub summarize_only: bool,
    /// Stamped by the dispatcher.
    pub name: String,
    /// Raw argument payload, stamped by the dispatcher.
    pub arguments: String,
}

impl ToolResultEnvelope {
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn send_directly(mut self) -> Self {
        self.send_directly_to_user = true;
        self
    }

    pub fn with_post_content(mut self, post_content: impl Into<String>) -> Self {
        self.post_content = Some(post_content.into());
        self
    }

    pub fn with_stream_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.stream_data
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    pub fn use_secondary_model(mut self) -> Self {
        self.use_secondary_model = true;
        self
    }

    pub fn force_no_functions(mut self) -> Self {
        self.force_no_functions = true;
        self
    }

    pub fn summarize_only(mut self) -> Self {
        self.summarize_only = true;
        self
    }

    /// Content that should be folded back into the conversation, if any.
    pub fn foldable_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|content| !content.is_empty())
    }

    /// Maps the known keys of an untyped result; unknown keys are ignored.
    ///
    /// `data` is accepted as an alias for `stream_data`.
    pub fn from_mapping(mapping: &Map<String, Value>) -> Result<Self, ToolError> {
        let flag = |key: &str| -> Result<bool, ToolError> {
            match mapping.get(key) {
                None | Some(Value::Null) => Ok(false),
                Some(Value::Bool(value)) => Ok(*value),
                Some(other) => Err(ToolError::execution(format!(
                    "result field '{key}' must be a boolean, got {other}"
                ))),
            }
        };

        let stream_data = match mapping.get("stream_data").or_else(|| mapping.get("data")) {
            None | Some(Value::Null) => None,
            Some(Value::Object(data)) => Some(data.clone()),
            Some(other) => {
                return Err(ToolError::execution(format!(
                    "result field 'stream_data' must be an object, got {other}"
                )));
            }
        };

        Ok(Self {
            content: text_field(mapping, "content"),
            send_directly_to_user: flag("send_directly_to_user")?,
            post_content: text_field(mapping, "post_content"),
            stream_data,
            use_secondary_model: flag("use_secondary_model")?,
            force_no_functions: flag("force_no_functions")?,
            summarize_only: flag("summarize_only")?,
            name: String::new(),
            arguments: String::new(),
        })
    }

    pub(crate) fn stamp(mut self, name: &str, arguments: &str) -> Self {
        self.name = name.to_string();
        self.arguments = arguments.to_string();
        self
    }
}

fn text_field(mapping: &Map<String, Value>, key: &str) -> Option<String> {
    match mapping.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(other) => Some(other.to_string()),
    }
}

/// Whatever a tool invocable hands back before normalization.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ToolOutput {
    Envelope(ToolResultEnvelope),
    Mapping(Map<String, Value>),
    Text(String),
    #[default]
    Nothing,
}

impl ToolOutput {
    /// `Ok(None)` means the tool produced nothing to fold back.
    pub fn into_envelope(self) -> Result<Option<ToolResultEnvelope>, ToolError> {
        match self {
            Self::Envelope(envelope) => Ok(Some(envelope)),
            Self::Mapping(mapping) => ToolResultEnvelope::from_mapping(&mapping).map(Some),
            Self::Text(text) => Ok(Some(ToolResultEnvelope::with_content(text))),
            Self::Nothing => Ok(None),
        }
    }
}

impl From<ToolResultEnvelope> for ToolOutput {
    fn from(value: ToolResultEnvelope) -> Self {
        Self::Envelope(value)
    }
}

impl From<Map<String, Value>> for ToolOutput {
    fn from(value: Map<String, Value>) -> Self {
        Self::Mapping(value)
    }
}

impl From<Value> for ToolOutput {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Nothing,
            Value::Object(mapping) => Self::Mapping(mapping),
            Value::String(text) => Self::Text(text),
            other => Self::Text(other.to_string()),
        }
    }
}

impl From<String> for ToolOutput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ToolOutput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<()> for ToolOutput {
    fn from(_: ()) -> Self {
        Self::Nothing
    }
}

impl<T> From<Option<T>> for ToolOutput
where
    T: Into<ToolOutput>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nothing, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn mapping(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("fixture should be an object")
    }

    #[test]
    fn mapping_defaults_missing_flags_to_false() {
        let envelope = ToolResultEnvelope::from_mapping(&mapping(json!({"content": "ok"})))
            .expect("mapping should normalize");

        assert_eq!(envelope.content.as_deref(), Some("ok"));
        assert!(!envelope.send_directly_to_user);
        assert!(!envelope.use_secondary_model);
        assert!(!envelope.force_no_functions);
        assert!(!envelope.summarize_only);
        assert!(envelope.post_content.is_none());
        assert!(envelope.stream_data.is_none());
    }

    #[test]
    fn mapping_accepts_data_alias_for_stream_data() {
        let envelope = ToolResultEnvelope::from_mapping(&mapping(json!({
            "content": "ok",
            "data": {"chart": [1, 2, 3]},
            "post_content": "See chart above."
        })))
        .expect("mapping should normalize");

        let stream_data = envelope.stream_data.expect("stream data should be set");
        assert_eq!(stream_data["chart"], json!([1, 2, 3]));
        assert_eq!(envelope.post_content.as_deref(), Some("See chart above."));
    }

    #[test]
    fn mapping_without_content_has_nothing_to_fold() {
        let envelope = ToolResultEnvelope::from_mapping(&mapping(json!({"send_directly_to_user": true})))
            .expect("mapping should normalize");
        assert!(envelope.content.is_none());
        assert!(envelope.foldable_content().is_none());
    }

    #[test]
    fn mistyped_flag_is_an_execution_error() {
        let error = ToolResultEnvelope::from_mapping(&mapping(json!({"send_directly_to_user": "yes"})))
            .expect_err("string flag must fail");
        assert_eq!(error.kind, crate::ToolErrorKind::Execution);
    }

    #[test]
    fn non_string_content_is_rendered_as_json() {
        let envelope = ToolResultEnvelope::from_mapping(&mapping(json!({"content": {"temp": 10}})))
            .expect("mapping should normalize");
        assert_eq!(envelope.content.as_deref(), Some("{\"temp\":10}"));
    }

    #[test]
    fn nothing_and_null_normalize_to_none() {
        assert_eq!(ToolOutput::Nothing.into_envelope().expect("ok"), None);
        assert_eq!(ToolOutput::from(Value::Null).into_envelope().expect("ok"), None);
        assert_eq!(ToolOutput::from(None::<String>).into_envelope().expect("ok"), None);
    }

    #[test]
    fn envelopes_pass_through_unchanged() {
        let original = ToolResultEnvelope::with_content("x")
            .force_no_functions()
            .summarize_only();
        let normalized = ToolOutput::from(original.clone())
            .into_envelope()
            .expect("ok")
            .expect("some");
        assert_eq!(normalized, original);
    }
}
