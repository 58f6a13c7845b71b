//! Unified facade over the cirrus workspace crates.
//!
//! Most applications depend on this crate alone. It re-exports the agent,
//! provider, memory, tooling, and observability crates and adds wiring for an
//! OpenAI-backed agent plus a few message and tool macros.
//!
//! ```rust,no_run
//! use cirrus::prelude::*;
//!
//! fn get_weather(args: &ToolArguments) -> Result<ToolOutput, ToolError> {
//!     let location = required_string(args, "location")?;
//!     Ok(ToolResultEnvelope::with_content(format!("10C in {location}"))
//!         .send_directly()
//!         .into())
//! }
//!
//! async fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     let tools = catalog([cirrus_tool!(
//!         get_weather,
//!         "Current weather for a city",
//!         r#"{"type":"object","properties":{"location":{"type":"string"}},"required":["location"]}"#
//!     )]);
//!
//!     let mut agent = openai_agent(ProviderBuildConfig::from_env(), AgentConfig::default())?
//!         .tools(tools)
//!         .history(cirrus_messages![user => "I'm in Tokyo.", assistant => "Noted."])
//!         .build()
//!         .await?;
//!
//!     println!("{}", agent.ask("What's the weather like?").await?);
//!     Ok(())
//! }
//! ```

mod macros;

pub mod prelude;
#[cfg(feature = "provider-openai")]
mod providers;
pub mod runtime;
pub mod util;

pub use cchat;
pub use ccommon;
pub use cmemory;
pub use cobserve;
pub use cprovider;
pub use ctooling;

pub use cchat::{
    Agent, AgentBuilder, AgentConfig, AgentOutput, AgentOutputStream, AgentReply,
    AlwaysUsePolicy, ChatError, ChatErrorKind, ChatErrorPhase, DEFAULT_MODEL,
    DEFAULT_SECONDARY_MODEL, DEFAULT_SYSTEM_MESSAGE, EventKind, EventMarker,
    HAVING_TROUBLE_MESSAGE, MODERATION_FAIL_MESSAGE, NoopTurnLoopHooks, OVERFLOW_MESSAGE,
    Termination, TurnLoopHooks, UNAVAILABLE_MESSAGE,
};
pub use ccommon::{BoxFuture, MetadataMap, SessionId};
pub use cmemory::{
    ConversationMemory, DedupPolicy, HeuristicTokenCounter, HistoryEntry, MemoryError,
    MemoryErrorKind, MemoryLimits, TokenCounter, WordTokenCounter,
};
pub use cobserve::{
    MetricsObservabilityHooks, SafeProviderHooks, SafeToolHooks, SafeTurnLoopHooks,
    TracingObservabilityHooks,
};
pub use cprovider::{
    BoxedDeltaStream, Embedding, EmbeddingProvider, FinishReason, Message, ModelProvider,
    ModelRequest, ModelResponse, ModerationProvider, ModerationVerdict, NoopOperationHooks,
    ProviderError, ProviderErrorKind, ProviderFuture, ProviderOperationHooks, RetryPolicy, Role,
    SecretString, StreamDelta, ToolCall, ToolCallFragment, ToolDefinition, VecDeltaStream,
};
#[cfg(feature = "provider-openai")]
pub use cprovider::{OpenAiHttpTransport, OpenAiProvider, OpenAiTransport};
pub use ctooling::{
    ActiveToolSet, Invocable, PatternGroupSpec, ToolArguments, ToolCallbacks, ToolCatalog,
    ToolDescriptor, ToolDispatchHooks, ToolEmbedding, ToolError, ToolErrorKind, ToolHandler,
    ToolOutput, ToolResultEnvelope, optional_string, parse_arguments, required_string,
};

#[cfg(feature = "provider-openai")]
pub use providers::{
    API_KEY_ENV, ProviderBuildConfig, build_openai_provider, build_provider_from_api_key,
};
#[cfg(feature = "provider-openai")]
pub use runtime::openai_agent;
pub use runtime::{agent_with_provider, observed};
pub use util::{
    assistant_message, catalog, history_entry, system_message, unmoderated_config, user_message,
};

#[cfg(test)]
mod tests {
    use crate::{Role, ToolArguments, ToolError, ToolOutput};

    #[test]
    fn cirrus_msg_macro_creates_expected_message() {
        let message = crate::cirrus_msg!(user => "hello");
        assert_eq!(message.role, Role::User);
        assert_eq!(message.text(), "hello");
    }

    #[test]
    fn cirrus_messages_macro_builds_message_vector() {
        let messages = crate::cirrus_messages![
            system => "You are concise.",
            user => "What's the weather in Tokyo?",
        ];

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
    }

    fn echo(args: &ToolArguments) -> Result<ToolOutput, ToolError> {
        Ok(args.clone().into())
    }

    #[test]
    fn cirrus_tool_macro_names_the_tool_after_the_function() {
        let tool = crate::cirrus_tool!(echo, "Echoes its arguments", r#"{"type":"object"}"#);

        assert_eq!(tool.name(), "echo");
        assert_eq!(tool.definition().description, "Echoes its arguments");
    }
}
