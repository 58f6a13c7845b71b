//! OpenAI provider implementation over transport and shared models.

use std::sync::Arc;

use async_stream::try_stream;
use futures_util::StreamExt;

use crate::{
    BoxedDeltaStream, Embedding, EmbeddingProvider, ModelProvider, ModelRequest, ModelResponse,
    ModerationProvider, ModerationVerdict, ProviderError, ProviderFuture, StreamDelta,
};

use super::serde_api::{EmbeddingRequest, ModerationRequest, build_chat_request};
use super::transport::OpenAiTransport;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Completion, moderation, and embedding provider backed by the OpenAI HTTP API.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    transport: Arc<dyn OpenAiTransport>,
    embedding_model: String,
}

impl OpenAiProvider {
    pub fn new(transport: Arc<dyn OpenAiTransport>) -> Self {
        Self {
            transport,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }
}

impl ModelProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            let request = build_chat_request(request, false)?;
            let response = self.transport.complete(request).await?;
            ModelResponse::try_from(response)
        })
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedDeltaStream<'a>, ProviderError>> {
        Box::pin(async move {
            let request = build_chat_request(request, true)?;
            let mut chunks = self.transport.stream(request).await?;

            let stream = try_stream! {
                while let Some(chunk) = chunks.next().await {
                    yield StreamDelta::from(chunk?);
                }
            };

            Ok(Box::pin(stream) as BoxedDeltaStream<'a>)
        })
    }
}

impl ModerationProvider for OpenAiProvider {
    fn check<'a>(
        &'a self,
        text: &'a str,
    ) -> ProviderFuture<'a, Result<ModerationVerdict, ProviderError>> {
        Box::pin(async move {
            let response = self
                .transport
                .moderate(ModerationRequest {
                    input: text.to_string(),
                })
                .await?;

            let result = response.results.into_iter().next().ok_or_else(|| {
                ProviderError::protocol("OpenAI moderation response did not include results")
            })?;

            Ok(ModerationVerdict {
                flagged: result.flagged,
                categories: result
                    .categories
                    .into_iter()
                    .filter_map(|(category, hit)| hit.then_some(category))
                    .collect(),
            })
        })
    }
}

impl EmbeddingProvider for OpenAiProvider {
    fn embed<'a>(&'a self, text: &'a str) -> ProviderFuture<'a, Result<Embedding, ProviderError>> {
        Box::pin(async move {
            let response = self
                .transport
                .embed(EmbeddingRequest {
                    model: self.embedding_model.clone(),
                    input: text.to_string(),
                })
                .await?;

            response
                .data
                .into_iter()
                .next()
                .map(|data| data.embedding)
                .ok_or_else(|| {
                    ProviderError::protocol("OpenAI embedding response did not include data")
                })
        })
    }
}
