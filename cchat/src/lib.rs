//! Tool-calling turn loop over model providers.
//!
//! An [`Agent`] owns one conversation: bounded memory, the tools selected for
//! the current ask, and the scratch thoughts of its tool rounds. Each ask is
//! moderated, then drives the provider until it answers, a tool result is
//! routed straight to the user, or a bound is hit.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use cchat::{Agent, AgentConfig};
//! use cprovider::ModelProvider;
//!
//! async fn run(provider: Arc<dyn ModelProvider>) -> Result<(), cchat::ChatError> {
//!     let mut agent = Agent::builder(provider)
//!         .config(AgentConfig {
//!             perform_moderation: false,
//!             ..AgentConfig::default()
//!         })
//!         .build()
//!         .await?;
//!
//!     let answer = agent.ask("What's the weather in Tokyo?").await?;
//!     println!("{answer}");
//!     Ok(())
//! }
//! ```

mod agent;
mod builder;
mod config;
mod error;
mod events;
mod hooks;
mod moderation;
mod scratch;
mod streaming;
mod types;

pub mod prelude {
    pub use crate::{
        Agent, AgentBuilder, AgentConfig, AgentOutput, AgentOutputStream, AgentReply,
        AlwaysUsePolicy, ChatError, ChatErrorKind, ChatErrorPhase, EventKind, EventMarker,
        ModerationGate, NoopTurnLoopHooks, Termination, TurnLoopHooks,
    };
    pub use ccommon::SessionId;
    pub use cprovider::{Message, Role};
    pub use ctooling::{
        Invocable, ToolCatalog, ToolDescriptor, ToolError, ToolErrorKind, ToolOutput,
        ToolResultEnvelope,
    };
}

pub use agent::Agent;
pub use builder::AgentBuilder;
pub use config::{
    AgentConfig, AlwaysUsePolicy, DEFAULT_MODEL, DEFAULT_SECONDARY_MODEL, DEFAULT_SYSTEM_MESSAGE,
    HAVING_TROUBLE_MESSAGE, MODERATION_FAIL_MESSAGE, OVERFLOW_MESSAGE, UNAVAILABLE_MESSAGE,
};
pub use error::{ChatError, ChatErrorKind, ChatErrorPhase};
pub use events::{EventKind, EventMarker, OVERSIZED_PAYLOAD};
pub use hooks::{NoopTurnLoopHooks, Termination, TurnLoopHooks};
pub use moderation::ModerationGate;
pub use scratch::{ScratchThoughts, ToolCallAccumulator};
pub use types::{AgentOutput, AgentOutputStream, AgentReply, CompletionCallback};
