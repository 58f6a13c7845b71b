//! Raw history entries as supplied by a client.
//!
//! ```rust
//! use cmemory::HistoryEntry;
//! use cprovider::Role;
//!
//! let entry: HistoryEntry = serde_json::from_str(r#"{"role":"user","content":"hi"}"#)
//!     .expect("entry should parse");
//! let message = entry.into_message().expect("entry should validate");
//! assert_eq!(message.role, Role::User);
//! ```

use cprovider::{Message, Role};
use serde::{Deserialize, Serialize};

use crate::MemoryError;

/// Loosely-typed transcript entry; validated into a [`Message`] before storage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl HistoryEntry {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            content: Some(content.into()),
            name: None,
        }
    }

    pub fn into_message(self) -> Result<Message, MemoryError> {
        let role = self
            .role
            .ok_or_else(|| MemoryError::validation("history entry is missing 'role'"))?;
        let role = Role::parse(&role)
            .ok_or_else(|| MemoryError::validation(format!("unknown role '{role}'")))?;
        let content = self
            .content
            .ok_or_else(|| MemoryError::validation("history entry is missing 'content'"))?;

        let mut message = Message::new(role, content);
        message.name = self.name;
        Ok(message)
    }
}

impl From<&Message> for HistoryEntry {
    fn from(value: &Message) -> Self {
        Self {
            role: Some(value.role.as_str().to_string()),
            content: value.content.clone(),
            name: value.name.clone(),
        }
    }
}

impl TryFrom<HistoryEntry> for Message {
    type Error = MemoryError;

    fn try_from(value: HistoryEntry) -> Result<Self, Self::Error> {
        value.into_message()
    }
}
