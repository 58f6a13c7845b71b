//! Buffered turn loop and the per-ask state shared with the streaming loop.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use ccommon::SessionId;
use cmemory::{DedupPolicy, HistoryEntry, SharedMemory, lock_memory};
use cprovider::{
    FinishReason, Message, ModelProvider, ModelRequest, ModelResponse, ProviderError,
    ProviderOperationHooks, RetryPolicy, ToolCall, execute_with_retry,
};
use ctooling::{ActiveToolSet, ToolCatalog, ToolDispatcher, ToolResultEnvelope, ToolSelector};
use futures_timer::Delay;

use crate::{
    AgentBuilder, AgentConfig, AgentReply, AlwaysUsePolicy, ChatError, ChatErrorPhase,
    CompletionCallback, HAVING_TROUBLE_MESSAGE, ModerationGate, OVERFLOW_MESSAGE, ScratchThoughts,
    Termination, TurnLoopHooks, UNAVAILABLE_MESSAGE,
};

/// State that lives for exactly one ask.
#[derive(Debug, Default)]
pub(crate) struct TurnState {
    pub(crate) scratch: ScratchThoughts,
    pub(crate) post_content: Vec<String>,
    pub(crate) use_secondary_model: bool,
    pub(crate) force_no_tools: bool,
    pub(crate) always_use_withdrawn: bool,
    pub(crate) iterations: usize,
}

impl TurnState {
    /// Post content collected so far, space-joined and newline-terminated.
    pub(crate) fn post_content_text(&self) -> String {
        if self.post_content.is_empty() {
            return String::new();
        }
        format!("{}\n", self.post_content.join(" "))
    }
}

pub(crate) enum RoundSignal {
    Final,
    ToolCalls,
}

/// A conversation session driving one provider through tool-calling rounds.
///
/// An agent is not reentrant: every ask takes `&mut self`. Independent agents
/// may run concurrently and share a catalog through `Arc<ToolCatalog>`.
pub struct Agent {
    pub(crate) session_id: SessionId,
    pub(crate) provider: Arc<dyn ModelProvider>,
    pub(crate) config: AgentConfig,
    pub(crate) gate: ModerationGate,
    pub(crate) catalog: Arc<ToolCatalog>,
    pub(crate) selector: ToolSelector,
    pub(crate) dispatcher: ToolDispatcher,
    pub(crate) memory: SharedMemory,
    pub(crate) system_message: Message,
    pub(crate) hooks: Arc<dyn TurnLoopHooks>,
    pub(crate) provider_hooks: Arc<dyn ProviderOperationHooks>,
    pub(crate) on_complete: Option<Arc<CompletionCallback>>,
    pub(crate) active_tools: ActiveToolSet,
    pub(crate) turn: TurnState,
    pub(crate) last_response: Option<String>,
}

impl Debug for Agent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("session_id", &self.session_id)
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .field("gate", &self.gate)
            .field("catalog_size", &self.catalog.len())
            .field("active_tools", &self.active_tools.names())
            .field("last_response", &self.last_response)
            .finish()
    }
}

impl Agent {
    pub fn builder(provider: Arc<dyn ModelProvider>) -> AgentBuilder {
        AgentBuilder::new(provider)
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Tools offered during the latest ask.
    pub fn active_tools(&self) -> &ActiveToolSet {
        &self.active_tools
    }

    pub fn memory(&self) -> SharedMemory {
        Arc::clone(&self.memory)
    }

    pub fn chat_history(&self) -> Result<Vec<Message>, ChatError> {
        Ok(lock_memory(&self.memory)?.turns())
    }

    pub fn clear_chat_history(&self) -> Result<(), ChatError> {
        lock_memory(&self.memory)?.clear();
        Ok(())
    }

    pub fn system_message(&self) -> &str {
        self.system_message.text()
    }

    pub fn set_system_message(&mut self, content: impl Into<String>) {
        self.system_message = Message::system(content);
    }

    /// Final answer of the latest ask, including fixed fallback messages.
    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    /// Replaces committed memory with externally supplied history.
    ///
    /// The history is moderated as a whole first; a flag rejects it without
    /// touching memory.
    pub async fn load_history(&mut self, history: Vec<Message>) -> Result<(), ChatError> {
        if !self.gate.is_history_safe(&history).await {
            return Err(ChatError::configuration("chat history contains flagged content")
                .with_phase(ChatErrorPhase::Moderation));
        }

        lock_memory(&self.memory)?.set_history(history, DedupPolicy::default())?;
        Ok(())
    }

    /// Validates raw client entries, then behaves like [`Agent::load_history`].
    pub async fn load_history_entries(
        &mut self,
        entries: impl IntoIterator<Item = HistoryEntry>,
    ) -> Result<(), ChatError> {
        let history = entries
            .into_iter()
            .map(HistoryEntry::into_message)
            .collect::<Result<Vec<_>, _>>()?;
        self.load_history(history).await
    }

    pub async fn ask(&mut self, query: &str) -> Result<String, ChatError> {
        self.respond(query).await.map(|reply| reply.text)
    }

    /// Runs one ask to completion and reports how it ended.
    pub async fn respond(&mut self, query: &str) -> Result<AgentReply, ChatError> {
        if !self
            .begin_ask(query, false)
            .await
            .map_err(|error| self.fail(error))?
        {
            return Ok(AgentReply {
                text: self.config.moderation_fail_message.clone(),
                termination: Termination::Refused,
                iterations: 0,
            });
        }

        match self.run_rounds().await {
            Ok(reply) => Ok(reply),
            Err(error) => Err(self.fail(error)),
        }
    }

    async fn run_rounds(&mut self) -> Result<AgentReply, ChatError> {
        let policy = self.config.retry_policy();

        while self.turn.iterations < self.config.loops_max {
            self.prepare_round();
            let iteration = self.turn.iterations;
            let request = self.build_request(false)?;
            self.hooks
                .on_round_start(iteration, &request.model, request.tools.len());

            let response = match self.complete_with_retry(request, &policy).await {
                Ok(response) => response,
                Err(error) => {
                    tracing::error!(
                        session = %self.session_id,
                        iteration,
                        error = %error,
                        "provider unavailable"
                    );
                    return self.finish_ask(UNAVAILABLE_MESSAGE.to_string(), Termination::Unavailable);
                }
            };
            self.hooks.on_round_finish(iteration, &response.finish_reason);

            match self.classify_finish(&response.finish_reason)? {
                RoundSignal::Final => {
                    let text = format!(
                        "{}{}",
                        response.message.text(),
                        self.turn.post_content_text()
                    );
                    return self.finish_ask(text, Termination::Answered);
                }
                RoundSignal::ToolCalls => {
                    let calls = response.message.tool_calls;
                    self.record_tool_request(&calls);

                    let mut direct = Vec::new();
                    for call in &calls {
                        self.dispatch_call(call, &mut direct)?;
                    }

                    if !direct.is_empty() {
                        let text = format!("{}{}", direct.join("\n"), self.turn.post_content_text());
                        return self.finish_ask(text, Termination::SentDirectly);
                    }
                }
            }

            if let Some(text) = self.overflow_text() {
                return self.finish_ask(text, Termination::Overflow);
            }
        }

        tracing::warn!(
            session = %self.session_id,
            loops_max = self.config.loops_max,
            "iteration cap reached without a final answer"
        );
        self.finish_ask(HAVING_TROUBLE_MESSAGE.to_string(), Termination::LoopLimit)
    }

    async fn complete_with_retry(
        &self,
        request: ModelRequest,
        policy: &RetryPolicy,
    ) -> Result<ModelResponse, ProviderError> {
        let provider = self.provider.as_ref();
        execute_with_retry(
            provider.name(),
            "complete",
            policy,
            self.provider_hooks.as_ref(),
            |_attempt| provider.complete(request.clone()),
            Delay::new,
        )
        .await
    }

    /// Moderates the query and prepares per-ask state. `Ok(false)` means refused.
    pub(crate) async fn begin_ask(&mut self, query: &str, streaming: bool) -> Result<bool, ChatError> {
        self.hooks.on_ask_start(query, streaming);

        if !self.gate.is_safe(query).await {
            self.hooks.on_ask_finish(Termination::Refused, 0);
            return Ok(false);
        }

        self.last_response = None;
        self.turn = TurnState::default();

        let recent = lock_memory(&self.memory)?.turns();
        self.active_tools = self.selector.select(&self.catalog, query, &recent).await;
        self.hooks.on_tools_selected(&self.active_tools.names());

        lock_memory(&self.memory)?.append(Message::user(query))?;
        Ok(true)
    }

    /// Counts the round and withdraws always-use tools once a tool round is recorded.
    pub(crate) fn prepare_round(&mut self) {
        self.turn.iterations += 1;

        if self.config.always_use_policy == AlwaysUsePolicy::FirstRoundOnly
            && !self.turn.always_use_withdrawn
            && !self.turn.scratch.is_empty()
        {
            self.turn.always_use_withdrawn = true;
            self.active_tools.remove_tools(&self.config.always_use);
        }
    }

    /// Builds the next provider request, consuming the single-round flags.
    pub(crate) fn build_request(&mut self, stream: bool) -> Result<ModelRequest, ChatError> {
        let model = if std::mem::take(&mut self.turn.use_secondary_model) {
            self.config.secondary_model.clone()
        } else {
            self.config.model.clone()
        };
        let force_no_tools = std::mem::take(&mut self.turn.force_no_tools);
        let history = lock_memory(&self.memory)?.turns();

        let mut builder = ModelRequest::builder(model)
            .message(self.system_message.clone())
            .messages(history)
            .messages(self.turn.scratch.entries().iter().cloned())
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .metadata("session_id", self.session_id.as_str())
            .streaming(stream);

        if !force_no_tools && !self.active_tools.is_empty() {
            builder = builder.tools(self.active_tools.definitions());
        }

        builder.build().map_err(|error| {
            ChatError::configuration(error.message).with_phase(ChatErrorPhase::Provider)
        })
    }

    pub(crate) fn classify_finish(&self, reason: &FinishReason) -> Result<RoundSignal, ChatError> {
        match reason {
            FinishReason::Stop | FinishReason::Length => Ok(RoundSignal::Final),
            FinishReason::ToolCalls => Ok(RoundSignal::ToolCalls),
            other => {
                tracing::error!(
                    session = %self.session_id,
                    finish_reason = %other,
                    "provider returned an unrecognized finish reason"
                );
                Err(ChatError::protocol(format!("unexpected finish reason '{other}'")))
            }
        }
    }

    pub(crate) fn record_tool_request(&mut self, calls: &[ToolCall]) {
        if calls.is_empty() {
            tracing::warn!(session = %self.session_id, "tool_calls finish without any calls");
            return;
        }

        tracing::info!(
            session = %self.session_id,
            tools = ?calls.iter().map(|call| call.name.as_str()).collect::<Vec<_>>(),
            "handling tool calls"
        );
        self.turn
            .scratch
            .push(Message::assistant_tool_calls(calls.to_vec()));
    }

    /// Dispatches one call and routes its result.
    ///
    /// Direct results are collected into `direct`; everything else with content
    /// is folded into scratch thoughts as a tool turn.
    pub(crate) fn dispatch_call(
        &mut self,
        call: &ToolCall,
        direct: &mut Vec<String>,
    ) -> Result<Option<ToolResultEnvelope>, ChatError> {
        let envelope = self
            .dispatcher
            .invoke(&self.active_tools, &call.name, &call.arguments)
            .map_err(|error| ChatError::from(error.with_tool_call_id(call.id.clone())))?;

        let Some(envelope) = envelope else {
            return Ok(None);
        };

        if envelope.send_directly_to_user
            && let Some(content) = envelope.foldable_content()
        {
            direct.push(content.to_string());
            return Ok(Some(envelope));
        }

        if let Some(content) = envelope.foldable_content() {
            self.turn
                .scratch
                .push(Message::tool_result(call.id.clone(), call.name.clone(), content));
        }

        if let Some(post_content) = envelope
            .post_content
            .as_deref()
            .filter(|post_content| !post_content.trim().is_empty())
        {
            self.turn.post_content.push(post_content.to_string());
        }

        self.turn.use_secondary_model |= envelope.use_secondary_model;
        self.turn.force_no_tools |= envelope.force_no_functions;
        Ok(Some(envelope))
    }

    /// Replacement answer once scratch thoughts exceed their ceiling.
    pub(crate) fn overflow_text(&self) -> Option<String> {
        let entries = self.turn.scratch.len();
        if entries <= self.config.internal_thoughts_max_entries {
            return None;
        }

        if self.turn.post_content.is_empty() {
            tracing::error!(session = %self.session_id, entries, "too many internal thoughts");
            Some(OVERFLOW_MESSAGE.to_string())
        } else {
            tracing::warn!(session = %self.session_id, entries, "too many internal thoughts; flushing post content");
            Some(self.turn.post_content_text())
        }
    }

    /// Commits the answer and notifies listeners.
    pub(crate) fn finish_ask(
        &mut self,
        text: String,
        termination: Termination,
    ) -> Result<AgentReply, ChatError> {
        lock_memory(&self.memory)?.append(Message::assistant(text.clone()))?;
        self.last_response = Some(text.clone());

        if termination.is_success()
            && let Some(callback) = &self.on_complete
        {
            callback(&text);
        }

        let iterations = self.turn.iterations;
        tracing::debug!(
            session = %self.session_id,
            termination = termination.as_str(),
            iterations,
            "ask finished"
        );
        self.hooks.on_ask_finish(termination, iterations);

        Ok(AgentReply {
            text,
            termination,
            iterations,
        })
    }

    pub(crate) fn fail(&self, error: ChatError) -> ChatError {
        tracing::warn!(session = %self.session_id, error = %error, "ask aborted");
        self.hooks
            .on_ask_finish(Termination::Failed, self.turn.iterations);
        error
    }
}
