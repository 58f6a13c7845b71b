//! Side-channel markers interleaved with streamed content.
//!
//! Markers render as `[[[kind:name:payload]]]` where `payload` is JSON. A
//! payload longer than the configured ceiling is replaced by
//! `{"error":"data too large"}`.
//!
//! ```rust
//! use cchat::EventMarker;
//! use serde_json::json;
//!
//! let marker = EventMarker::data("forecast", &json!({"high": 12}), 2000);
//! assert_eq!(marker.render(), r#"[[[data:forecast:{"high":12}]]]"#);
//! ```

use std::fmt::{Display, Formatter};

use cprovider::ToolCall;
use serde_json::Value;

pub const OVERSIZED_PAYLOAD: &str = r#"{"error":"data too large"}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A tool is about to be invoked.
    Function,
    /// Auxiliary structured output produced by a tool.
    Data,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Data => "data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMarker {
    pub kind: EventKind,
    pub name: String,
    pub payload: String,
}

impl EventMarker {
    pub fn new(kind: EventKind, name: impl Into<String>, payload: String, max_size: usize) -> Self {
        let payload = if payload.len() > max_size {
            tracing::debug!(
                kind = kind.as_str(),
                size = payload.len(),
                max_size,
                "event payload exceeds size ceiling"
            );
            OVERSIZED_PAYLOAD.to_string()
        } else {
            payload
        };

        Self {
            kind,
            name: name.into(),
            payload,
        }
    }

    /// Marker for a requested tool call; the payload is the call itself.
    pub fn function(call: &ToolCall, max_size: usize) -> Self {
        let payload = serde_json::to_string(call).unwrap_or_else(|_| OVERSIZED_PAYLOAD.to_string());
        Self::new(EventKind::Function, call.name.clone(), payload, max_size)
    }

    pub fn data(key: impl Into<String>, value: &Value, max_size: usize) -> Self {
        Self::new(EventKind::Data, key, value.to_string(), max_size)
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl Display for EventMarker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[[[{}:{}:{}]]]", self.kind.as_str(), self.name, self.payload)
    }
}
