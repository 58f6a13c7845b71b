//! Common `cprovider` imports for downstream crates.

pub use crate::{
    BoxedDeltaStream, Embedding, EmbeddingProvider, FinishReason, Message, ModelProvider,
    ModelRequest, ModelRequestBuilder, ModelResponse, ModerationProvider, ModerationVerdict,
    NoopOperationHooks, ProviderError, ProviderErrorKind, ProviderFuture, ProviderOperationHooks,
    RetryPolicy, Role, StreamDelta, TokenUsage, ToolCall, ToolCallFragment, ToolChoice,
    ToolDefinition, execute_with_retry,
};
pub use ccommon::{BoxFuture, MetadataMap};
