#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use cchat::{AgentConfig, Termination, TurnLoopHooks};
use cprovider::{
    BoxedDeltaStream, FinishReason, ModelProvider, ModelRequest, ModelResponse,
    ModerationProvider, ModerationVerdict, ProviderError, ProviderFuture, StreamDelta,
    VecDeltaStream,
};
use ctooling::{Invocable, ToolCatalog, ToolDescriptor, ToolResultEnvelope, required_string};

pub type ScriptedStream = Result<Vec<Result<StreamDelta, ProviderError>>, ProviderError>;

/// Provider that replays scripted completions and streams in order.
#[derive(Default)]
pub struct ScriptedProvider {
    completions: Mutex<VecDeque<Result<ModelResponse, ProviderError>>>,
    streams: Mutex<VecDeque<ScriptedStream>>,
    fallback: Option<ModelResponse>,
    fallback_stream: Option<Vec<StreamDelta>>,
    pub requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedProvider {
    pub fn completions(script: Vec<Result<ModelResponse, ProviderError>>) -> Self {
        Self {
            completions: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn streams(script: Vec<ScriptedStream>) -> Self {
        Self {
            streams: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    /// Answers every completion with `response` once the script is exhausted.
    pub fn repeating(response: ModelResponse) -> Self {
        Self {
            fallback: Some(response),
            ..Self::default()
        }
    }

    /// Replays `deltas` for every stream once the script is exhausted.
    pub fn repeating_stream(deltas: Vec<StreamDelta>) -> Self {
        Self {
            fallback_stream: Some(deltas),
            ..Self::default()
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }

    pub fn request(&self, index: usize) -> ModelRequest {
        self.requests.lock().expect("requests lock")[index].clone()
    }

    pub fn tool_names(&self, index: usize) -> Vec<String> {
        self.request(index)
            .tools
            .iter()
            .map(|tool| tool.name.clone())
            .collect()
    }
}

impl ModelProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            self.requests
                .lock()
                .expect("requests lock")
                .push(request);

            let next = self.completions.lock().expect("completions lock").pop_front();
            match (next, &self.fallback) {
                (Some(result), _) => result,
                (None, Some(response)) => Ok(response.clone()),
                (None, None) => Err(ProviderError::protocol("completion script exhausted")),
            }
        })
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedDeltaStream<'a>, ProviderError>> {
        Box::pin(async move {
            self.requests
                .lock()
                .expect("requests lock")
                .push(request);

            let next = self.streams.lock().expect("streams lock").pop_front();
            let next = match (next, &self.fallback_stream) {
                (Some(script), _) => script?,
                (None, Some(deltas)) => deltas.iter().cloned().map(Ok).collect(),
                (None, None) => return Err(ProviderError::protocol("stream script exhausted")),
            };
            Ok(Box::pin(VecDeltaStream::new(next)) as BoxedDeltaStream<'a>)
        })
    }
}

/// Flags any text containing `needle`; fails every check when `outage` is set.
pub struct KeywordModeration {
    pub needle: String,
    pub outage: bool,
    pub checked: Mutex<Vec<String>>,
}

impl KeywordModeration {
    pub fn flagging(needle: &str) -> Self {
        Self {
            needle: needle.to_string(),
            outage: false,
            checked: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            outage: true,
            ..Self::flagging("")
        }
    }
}

impl ModerationProvider for KeywordModeration {
    fn check<'a>(
        &'a self,
        text: &'a str,
    ) -> ProviderFuture<'a, Result<ModerationVerdict, ProviderError>> {
        Box::pin(async move {
            self.checked
                .lock()
                .expect("checked lock")
                .push(text.to_string());
            if self.outage {
                return Err(ProviderError::transport("moderation endpoint unreachable"));
            }
            if !self.needle.is_empty() && text.contains(&self.needle) {
                return Ok(ModerationVerdict::flagged(["violence"]));
            }
            Ok(ModerationVerdict::safe())
        })
    }
}

#[derive(Default)]
pub struct RecordingTurnHooks {
    pub events: Mutex<Vec<String>>,
}

impl RecordingTurnHooks {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }
}

impl TurnLoopHooks for RecordingTurnHooks {
    fn on_ask_start(&self, _query: &str, streaming: bool) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("ask_start:{streaming}"));
    }

    fn on_tools_selected(&self, names: &[String]) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("tools:{}", names.join(",")));
    }

    fn on_round_start(&self, iteration: usize, model: &str, tool_count: usize) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("round_start:{iteration}:{model}:{tool_count}"));
    }

    fn on_round_finish(&self, iteration: usize, finish_reason: &FinishReason) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("round_finish:{iteration}:{finish_reason}"));
    }

    fn on_ask_finish(&self, termination: Termination, iterations: usize) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("ask_finish:{}:{iterations}", termination.as_str()));
    }
}

pub const LOCATION_SCHEMA: &str =
    r#"{"type":"object","properties":{"location":{"type":"string"}},"required":["location"]}"#;

/// Config with moderation off and retries that do not sleep.
pub fn quiet_config() -> AgentConfig {
    AgentConfig {
        perform_moderation: false,
        retry_backoff_ms: 0,
        ..AgentConfig::default()
    }
}

/// `get_weather` answers "10C" straight to the user and records each location asked for.
pub fn direct_weather_tool(locations: Arc<Mutex<Vec<String>>>) -> ToolDescriptor {
    ToolDescriptor::new(
        "get_weather",
        "Current temperature for a location",
        LOCATION_SCHEMA,
        Invocable::function(move |args| {
            let location = required_string(args, "location")?;
            locations.lock().expect("locations lock").push(location);
            Ok(ToolResultEnvelope::with_content("10C").send_directly().into())
        }),
    )
}

/// A tool that always folds `content` back into the conversation.
pub fn text_tool(name: &str, content: &'static str) -> ToolDescriptor {
    ToolDescriptor::new(
        name,
        format!("Returns {content}"),
        r#"{"type":"object","properties":{}}"#,
        Invocable::function(move |_args| Ok(content.into())),
    )
}

pub fn catalog(tools: Vec<ToolDescriptor>) -> ToolCatalog {
    tools.into_iter().collect()
}
