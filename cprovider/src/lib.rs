//! Provider contracts for completion, moderation, and embedding collaborators.
//!
//! ```rust
//! use cprovider::{Message, ModelRequest, ToolDefinition};
//!
//! let request = ModelRequest::builder("gpt-4-0613")
//!     .message(Message::system("You are a helpful assistant."))
//!     .message(Message::user("What's the weather in Tokyo?"))
//!     .tools(vec![ToolDefinition::new(
//!         "get_weather",
//!         "Current weather for a city",
//!         r#"{"type":"object","properties":{"location":{"type":"string"}}}"#,
//!     )])
//!     .temperature(0.1)
//!     .build()
//!     .expect("request should be valid");
//!
//! assert_eq!(request.tools.len(), 1);
//! ```

pub mod adapters;
mod credentials;
mod embedding;
mod error;
mod model;
mod moderation;
pub mod prelude;
mod provider;
mod resilience;
mod stream;

pub use credentials::SecretString;
pub use embedding::{Embedding, EmbeddingProvider, cosine_similarity};
pub use error::{ProviderError, ProviderErrorKind};
pub use model::{
    FinishReason, Message, ModelRequest, ModelRequestBuilder, ModelResponse, Role, TokenUsage,
    ToolCall, ToolChoice, ToolDefinition,
};
pub use moderation::{ModerationProvider, ModerationVerdict};
pub use provider::{ModelProvider, ProviderFuture};
pub use resilience::{
    NoopOperationHooks, ProviderOperationHooks, RetryPolicy, execute_with_retry,
};
pub use stream::{
    BoxedDeltaStream, ModelDeltaStream, StreamDelta, ToolCallFragment, VecDeltaStream,
};

#[cfg(feature = "provider-openai")]
pub use adapters::openai::{OpenAiHttpTransport, OpenAiProvider, OpenAiTransport};
