//! OpenAI transport trait and reqwest-based HTTP implementation.

use std::pin::Pin;

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{ProviderError, ProviderFuture, SecretString};

use super::serde_api::{
    ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, EmbeddingRequest,
    EmbeddingResponse, ModerationRequest, ModerationResponse, extract_error_message,
};

pub type OpenAiChunkStream<'a> =
    Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk, ProviderError>> + Send + 'a>>;

pub trait OpenAiTransport: Send + Sync + std::fmt::Debug {
    fn complete<'a>(
        &'a self,
        request: ChatCompletionRequest,
    ) -> ProviderFuture<'a, Result<ChatCompletionResponse, ProviderError>>;

    fn stream<'a>(
        &'a self,
        request: ChatCompletionRequest,
    ) -> ProviderFuture<'a, Result<OpenAiChunkStream<'a>, ProviderError>>;

    fn moderate<'a>(
        &'a self,
        request: ModerationRequest,
    ) -> ProviderFuture<'a, Result<ModerationResponse, ProviderError>>;

    fn embed<'a>(
        &'a self,
        request: EmbeddingRequest,
    ) -> ProviderFuture<'a, Result<EmbeddingResponse, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct OpenAiHttpTransport {
    client: Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenAiHttpTransport {
    pub fn new(client: Client, api_key: impl Into<SecretString>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Response, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::authentication("OpenAI API key is not configured"));
        }

        let response = self
            .client
            .post(self.endpoint(path))
            .bearer_auth(self.api_key.expose())
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }

        Ok(response)
    }

    async fn post_json<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, ProviderError> {
        let response = self.send(path, body).await?;
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&bytes).map_err(|err| ProviderError::protocol(err.to_string()))
    }

    async fn parse_error(response: Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .unwrap_or_else(|| format!("OpenAI request failed with status {status}"));

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ProviderError::authentication(message)
            }
            StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                ProviderError::timeout(message)
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ProviderError::invalid_request(message)
            }
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                ProviderError::unavailable(message)
            }
            _ => ProviderError::transport(message),
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout(err.to_string())
    } else {
        ProviderError::transport(err.to_string())
    }
}

/// Splits complete `data:` payloads off the front of an SSE buffer.
///
/// Returns `None` for the payload slot once `[DONE]` is seen.
pub(crate) fn drain_sse_payloads(buffer: &mut Vec<u8>) -> Vec<Option<String>> {
    let mut payloads = Vec::new();

    while let Some(newline) = buffer.iter().position(|byte| *byte == b'\n') {
        let line = buffer.drain(..=newline).collect::<Vec<_>>();
        let line = String::from_utf8_lossy(&line);
        let line = line.trim();

        let Some(payload) = line.strip_prefix("data:") else {
            continue;
        };

        let payload = payload.trim();
        if payload == "[DONE]" {
            payloads.push(None);
            break;
        }

        if !payload.is_empty() {
            payloads.push(Some(payload.to_string()));
        }
    }

    payloads
}

impl OpenAiTransport for OpenAiHttpTransport {
    fn complete<'a>(
        &'a self,
        request: ChatCompletionRequest,
    ) -> ProviderFuture<'a, Result<ChatCompletionResponse, ProviderError>> {
        Box::pin(async move { self.post_json("chat/completions", &request).await })
    }

    fn stream<'a>(
        &'a self,
        mut request: ChatCompletionRequest,
    ) -> ProviderFuture<'a, Result<OpenAiChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            request.stream = true;
            let response = self.send("chat/completions", &request).await?;

            let stream = try_stream! {
                let mut bytes = response.bytes_stream();
                let mut buffer = Vec::new();

                'read: while let Some(item) = bytes.next().await {
                    let chunk = item.map_err(map_reqwest_error)?;
                    buffer.extend_from_slice(&chunk);

                    for payload in drain_sse_payloads(&mut buffer) {
                        let Some(payload) = payload else {
                            break 'read;
                        };
                        let parsed: ChatCompletionChunk = serde_json::from_str(&payload)
                            .map_err(|err| ProviderError::protocol(err.to_string()))?;
                        yield parsed;
                    }
                }
            };

            Ok(Box::pin(stream) as OpenAiChunkStream<'a>)
        })
    }

    fn moderate<'a>(
        &'a self,
        request: ModerationRequest,
    ) -> ProviderFuture<'a, Result<ModerationResponse, ProviderError>> {
        Box::pin(async move { self.post_json("moderations", &request).await })
    }

    fn embed<'a>(
        &'a self,
        request: EmbeddingRequest,
    ) -> ProviderFuture<'a, Result<EmbeddingResponse, ProviderError>> {
        Box::pin(async move { self.post_json("embeddings", &request).await })
    }
}
