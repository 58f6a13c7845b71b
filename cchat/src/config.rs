//! Agent configuration surface.
//!
//! Configuration is code-first, but every field also deserializes with
//! defaults so an embedding application can load it from a document.
//!
//! ```rust
//! use cchat::{AgentConfig, AlwaysUsePolicy};
//!
//! let config: AgentConfig = serde_json::from_str(
//!     r#"{"model":"gpt-4o-mini","loops_max":4,"always_use":["get_weather"]}"#,
//! )
//! .expect("config should parse");
//!
//! assert_eq!(config.model, "gpt-4o-mini");
//! assert_eq!(config.loops_max, 4);
//! assert_eq!(config.always_use_policy, AlwaysUsePolicy::FirstRoundOnly);
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use cmemory::{DEFAULT_MAX_MESSAGES, DEFAULT_MAX_TOKENS, MemoryLimits};
use cprovider::RetryPolicy;
use ctooling::{
    DEFAULT_K_NEAREST, DEFAULT_MIN_SIMILARITY, DEFAULT_TOOL_TOKEN_BUDGET, PatternGroupSpec,
    SelectorConfig, ToolEmbedding,
};
use serde::Deserialize;

use crate::ChatError;

pub const DEFAULT_MODEL: &str = "gpt-4-0613";
pub const DEFAULT_SECONDARY_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful assistant.";
pub const MODERATION_FAIL_MESSAGE: &str =
    "I'm sorry, I can't help you with that as it is not appropriate.";
pub const HAVING_TROUBLE_MESSAGE: &str = "I'm sorry, I'm having trouble understanding you.";
pub const UNAVAILABLE_MESSAGE: &str = "AI temporarily unavailable.";
pub const OVERFLOW_MESSAGE: &str = "Too many internal thoughts.";

/// When always-use tools stop being offered during one ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlwaysUsePolicy {
    /// Offered on the first provider round, withdrawn once the first tool round
    /// has been recorded.
    #[default]
    FirstRoundOnly,
    /// Offered on every round.
    Persist,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub model: String,
    pub secondary_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_message: String,

    pub memory_max_entries: Option<usize>,
    pub memory_max_tokens: Option<usize>,
    pub internal_thoughts_max_entries: usize,
    pub loops_max: usize,

    pub perform_moderation: bool,
    pub moderation_fail_message: String,

    pub tool_token_budget: usize,
    pub k_nearest: usize,
    pub min_similarity: f32,
    pub always_use: Vec<String>,
    pub always_use_policy: AlwaysUsePolicy,
    pub pattern_groups: Vec<PatternGroupSpec>,
    pub tool_embeddings: Vec<ToolEmbedding>,

    pub send_events: bool,
    pub max_event_size: usize,

    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            secondary_model: DEFAULT_SECONDARY_MODEL.to_string(),
            temperature: 0.1,
            max_tokens: 500,
            system_message: DEFAULT_SYSTEM_MESSAGE.to_string(),
            memory_max_entries: Some(DEFAULT_MAX_MESSAGES),
            memory_max_tokens: Some(DEFAULT_MAX_TOKENS),
            internal_thoughts_max_entries: 8,
            loops_max: 10,
            perform_moderation: true,
            moderation_fail_message: MODERATION_FAIL_MESSAGE.to_string(),
            tool_token_budget: DEFAULT_TOOL_TOKEN_BUDGET,
            k_nearest: DEFAULT_K_NEAREST,
            min_similarity: DEFAULT_MIN_SIMILARITY,
            always_use: Vec::new(),
            always_use_policy: AlwaysUsePolicy::default(),
            pattern_groups: Vec::new(),
            tool_embeddings: Vec::new(),
            send_events: false,
            max_event_size: 2000,
            max_retries: 1,
            retry_backoff_ms: 1000,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.model.trim().is_empty() {
            return Err(ChatError::configuration("model must not be empty"));
        }

        if self.secondary_model.trim().is_empty() {
            return Err(ChatError::configuration("secondary_model must not be empty"));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ChatError::configuration(
                "temperature must be in the inclusive range 0.0..=2.0",
            ));
        }

        if self.max_tokens == 0 {
            return Err(ChatError::configuration("max_tokens must be greater than zero"));
        }

        if self.loops_max == 0 {
            return Err(ChatError::configuration("loops_max must be at least 1"));
        }

        if self.send_events && self.max_event_size == 0 {
            return Err(ChatError::configuration(
                "max_event_size must be greater than zero when events are enabled",
            ));
        }

        self.compile_pattern_groups().map(|_| ())
    }

    pub fn memory_limits(&self) -> MemoryLimits {
        MemoryLimits::new(self.memory_max_tokens, self.memory_max_entries)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_backoff_ms))
    }

    pub fn selector_config(&self) -> Result<SelectorConfig, ChatError> {
        Ok(SelectorConfig {
            always_use: self.always_use.clone(),
            pattern_groups: self.compile_pattern_groups()?,
            embeddings: self.tool_embeddings.clone(),
            k_nearest: self.k_nearest,
            min_similarity: self.min_similarity,
            token_budget: self.tool_token_budget,
        })
    }

    fn compile_pattern_groups(&self) -> Result<Vec<ctooling::PatternGroup>, ChatError> {
        self.pattern_groups
            .iter()
            .map(|spec| {
                spec.compile()
                    .map_err(|err| ChatError::configuration(err.message))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChatErrorKind;

    #[test]
    fn defaults_match_documented_values() {
        let config = AgentConfig::default();

        assert_eq!(config.model, "gpt-4-0613");
        assert_eq!(config.secondary_model, "gpt-3.5-turbo");
        assert_eq!(config.max_tokens, 500);
        assert_eq!(config.internal_thoughts_max_entries, 8);
        assert_eq!(config.loops_max, 10);
        assert!(config.perform_moderation);
        assert!(!config.send_events);
        assert_eq!(config.max_event_size, 2000);
        assert_eq!(config.memory_limits(), MemoryLimits::new(Some(2000), Some(20)));
        assert_eq!(
            config.retry_policy(),
            RetryPolicy::new(1, Duration::from_secs(1))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_loop_cap_is_rejected() {
        let config = AgentConfig {
            loops_max: 0,
            ..AgentConfig::default()
        };

        let error = config.validate().expect_err("config should fail");
        assert_eq!(error.kind, ChatErrorKind::Configuration);
    }

    #[test]
    fn invalid_pattern_is_a_configuration_error() {
        let config = AgentConfig {
            pattern_groups: vec![PatternGroupSpec {
                pattern: "(weather".to_string(),
                tools: vec!["get_weather".to_string()],
            }],
            ..AgentConfig::default()
        };

        let error = config.validate().expect_err("config should fail");
        assert_eq!(error.kind, ChatErrorKind::Configuration);
        assert!(config.selector_config().is_err());
    }

    #[test]
    fn selector_config_carries_tool_settings() {
        let config = AgentConfig {
            always_use: vec!["get_weather".to_string()],
            pattern_groups: vec![PatternGroupSpec {
                pattern: r"(?i)\bweather\b".to_string(),
                tools: vec!["get_forecast".to_string()],
            }],
            tool_token_budget: 0,
            ..AgentConfig::default()
        };

        let selector = config.selector_config().expect("selector config");
        assert_eq!(selector.always_use, vec!["get_weather".to_string()]);
        assert_eq!(selector.pattern_groups.len(), 1);
        assert_eq!(selector.token_budget, 0);
        assert_eq!(selector.k_nearest, 3);
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let config: AgentConfig = serde_json::from_str(
            r#"{"send_events":true,"always_use_policy":"persist","memory_max_entries":null}"#,
        )
        .expect("config should parse");

        assert!(config.send_events);
        assert_eq!(config.always_use_policy, AlwaysUsePolicy::Persist);
        assert_eq!(config.memory_max_entries, None);
        assert_eq!(config.model, DEFAULT_MODEL);
    }
}
