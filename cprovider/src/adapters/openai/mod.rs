mod provider;
mod serde_api;
mod transport;

pub use provider::{DEFAULT_EMBEDDING_MODEL, OpenAiProvider};
pub use serde_api::{
    ApiUsage, ChatChoice, ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse,
    ChunkChoice, ChunkDelta, ChunkFunction, ChunkToolCall, EmbeddingData, EmbeddingRequest,
    EmbeddingResponse, LEGACY_FUNCTION_CALL_ID, ModerationRequest, ModerationResponse,
    ModerationResult, WireFunctionCall, WireMessage, WireToolCall,
};
pub use transport::{OpenAiChunkStream, OpenAiHttpTransport, OpenAiTransport};
