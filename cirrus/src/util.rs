//! Small convenience constructors for common types.

use crate::{AgentConfig, HistoryEntry, Message, ToolCatalog, ToolDescriptor};

pub fn system_message(content: impl Into<String>) -> Message {
    Message::system(content)
}

pub fn user_message(content: impl Into<String>) -> Message {
    Message::user(content)
}

pub fn assistant_message(content: impl Into<String>) -> Message {
    Message::assistant(content)
}

/// Raw history entry as a client would send it; validated when loaded.
pub fn history_entry(role: impl Into<String>, content: impl Into<String>) -> HistoryEntry {
    HistoryEntry::new(role, content)
}

pub fn catalog(tools: impl IntoIterator<Item = ToolDescriptor>) -> ToolCatalog {
    tools.into_iter().collect()
}

/// Default agent configuration with moderation switched off.
pub fn unmoderated_config() -> AgentConfig {
    AgentConfig {
        perform_moderation: false,
        ..AgentConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use crate::{DEFAULT_MODEL, Invocable, Role, ToolDescriptor};

    use super::{catalog, history_entry, unmoderated_config, user_message};

    #[test]
    fn helpers_apply_expected_defaults() {
        assert_eq!(user_message("hello").role, Role::User);
        assert_eq!(
            history_entry("User", "hello")
                .into_message()
                .expect("entry should validate"),
            user_message("hello")
        );

        let config = unmoderated_config();
        assert!(!config.perform_moderation);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn catalog_collects_descriptors_by_name() {
        let tools = catalog(vec![ToolDescriptor::new(
            "now",
            "Current time",
            r#"{"type":"object","properties":{}}"#,
            Invocable::function(|_args| Ok("12:00".into())),
        )]);

        assert!(tools.contains("now"));
        assert_eq!(tools.len(), 1);
    }
}
