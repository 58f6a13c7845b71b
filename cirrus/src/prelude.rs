//! Common imports for most cirrus applications.

pub use crate::{
    Agent, AgentBuilder, AgentConfig, AgentOutput, AgentReply, AlwaysUsePolicy, ChatError,
    ChatErrorKind, EventKind, EventMarker, HistoryEntry, Invocable, Message, ModelProvider,
    PatternGroupSpec, ProviderError, Role, SessionId, Termination, ToolArguments, ToolCatalog,
    ToolDescriptor, ToolError, ToolOutput, ToolResultEnvelope, TracingObservabilityHooks,
    TurnLoopHooks, optional_string, required_string,
};
pub use crate::{
    agent_with_provider, assistant_message, catalog, history_entry, observed, system_message,
    unmoderated_config, user_message,
};
pub use crate::{cirrus_messages, cirrus_msg, cirrus_tool};
#[cfg(feature = "provider-openai")]
pub use crate::{ProviderBuildConfig, build_openai_provider, openai_agent};
