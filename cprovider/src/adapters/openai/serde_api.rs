//! OpenAI HTTP payload serde models and conversion helpers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    FinishReason, Message, ModelRequest, ModelResponse, ProviderError, Role, StreamDelta,
    TokenUsage, ToolCall, ToolCallFragment,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(default = "assistant_role")]
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,
    /// Legacy single-call form; read from responses, never sent.
    #[serde(default, skip_serializing)]
    pub function_call: Option<WireFunctionCall>,
}

/// Call id assigned to a legacy `function_call`, which carries none.
pub const LEGACY_FUNCTION_CALL_ID: &str = "call_function";

fn assistant_role() -> String {
    Role::Assistant.as_str().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub kind: String,
    pub function: WireFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireFunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

impl From<Message> for WireMessage {
    fn from(value: Message) -> Self {
        let tool_calls = (!value.tool_calls.is_empty()).then(|| {
            value
                .tool_calls
                .into_iter()
                .map(|call| WireToolCall {
                    id: call.id,
                    kind: function_type(),
                    function: WireFunctionCall {
                        name: call.name,
                        arguments: call.arguments,
                    },
                })
                .collect()
        });

        Self {
            role: value.role.as_str().to_string(),
            content: value.content,
            name: value.name,
            tool_call_id: value.tool_call_id,
            tool_calls,
            function_call: None,
        }
    }
}

impl TryFrom<WireMessage> for Message {
    type Error = ProviderError;

    fn try_from(value: WireMessage) -> Result<Self, Self::Error> {
        let role = Role::parse(&value.role).ok_or_else(|| {
            ProviderError::protocol(format!("unknown message role '{}'", value.role))
        })?;

        let mut tool_calls: Vec<ToolCall> = value
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall::new(call.id, call.function.name, call.function.arguments))
            .collect();
        if tool_calls.is_empty()
            && let Some(function) = value.function_call
        {
            tool_calls.push(ToolCall::new(
                LEGACY_FUNCTION_CALL_ID,
                function.name,
                function.arguments,
            ));
        }

        Ok(Self {
            role,
            content: value.content,
            name: value.name,
            tool_call_id: value.tool_call_id,
            tool_calls,
        })
    }
}

pub(crate) fn build_chat_request(
    request: ModelRequest,
    stream: bool,
) -> Result<ChatCompletionRequest, ProviderError> {
    request.validate()?;

    let tools = if request.tools.is_empty() {
        None
    } else {
        Some(
            request
                .tools
                .iter()
                .map(|tool| tool.to_function_json())
                .collect::<Result<Vec<_>, _>>()?,
        )
    };

    Ok(ChatCompletionRequest {
        model: request.model,
        messages: request.messages.into_iter().map(WireMessage::from).collect(),
        tool_choice: tools
            .as_ref()
            .and(request.tool_choice)
            .map(|choice| choice.as_str().to_string()),
        tools,
        temperature: request.options.temperature,
        max_tokens: request.options.max_tokens,
        stream,
    })
}

pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<ApiErrorEnvelope>(body).ok()?;
    Some(parsed.error.message)
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub model: String,
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ApiUsage>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatChoice {
    pub message: WireMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ApiUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

fn finish_reason(value: Option<&str>) -> FinishReason {
    value.map_or_else(|| FinishReason::Other("missing".to_string()), FinishReason::parse)
}

impl TryFrom<ChatCompletionResponse> for ModelResponse {
    type Error = ProviderError;

    fn try_from(value: ChatCompletionResponse) -> Result<Self, Self::Error> {
        let choice = value
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::protocol("OpenAI response did not include choices"))?;

        let usage = value.usage.map_or_else(TokenUsage::default, |usage| TokenUsage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        });

        Ok(Self {
            model: value.model,
            finish_reason: finish_reason(choice.finish_reason.as_deref()),
            message: Message::try_from(choice.message)?,
            usage,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ChunkToolCall>>,
    #[serde(default)]
    pub function_call: Option<ChunkFunction>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChunkToolCall {
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<ChunkFunction>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChunkFunction {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

impl From<ChatCompletionChunk> for StreamDelta {
    fn from(value: ChatCompletionChunk) -> Self {
        let Some(choice) = value.choices.into_iter().next() else {
            return StreamDelta::default();
        };

        let legacy = choice.delta.function_call.map(|function| ToolCallFragment {
            index: 0,
            id: Some(LEGACY_FUNCTION_CALL_ID.to_string()),
            name: function.name,
            arguments: function.arguments,
        });

        let mut tool_calls: Vec<ToolCallFragment> = choice
            .delta
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                let (name, arguments) = call
                    .function
                    .map(|function| (function.name, function.arguments))
                    .unwrap_or_default();
                ToolCallFragment {
                    index: call.index.unwrap_or(0),
                    id: call.id,
                    name,
                    arguments,
                }
            })
            .collect();
        if tool_calls.is_empty() {
            tool_calls.extend(legacy);
        }

        StreamDelta {
            content: choice.delta.content.filter(|content| !content.is_empty()),
            tool_calls,
            finish_reason: choice.finish_reason.as_deref().map(FinishReason::parse),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModerationRequest {
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModerationResponse {
    #[serde(default)]
    pub results: Vec<ModerationResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModerationResult {
    pub flagged: bool,
    #[serde(default)]
    pub categories: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmbeddingResponse {
    #[serde(default)]
    pub data: Vec<EmbeddingData>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmbeddingData {
    pub embedding: Vec<f32>,
}
