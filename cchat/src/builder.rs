//! Assembly of an [`Agent`] from its collaborators.

use std::sync::Arc;

use ccommon::SessionId;
use cmemory::{ConversationMemory, HeuristicTokenCounter, HistoryEntry, TokenCounter, shared};
use cprovider::{
    EmbeddingProvider, Message, ModelProvider, ModerationProvider, NoopOperationHooks,
    ProviderOperationHooks,
};
use ctooling::{
    ActiveToolSet, ToolCallbacks, ToolCatalog, ToolDispatchHooks, ToolDispatcher, ToolSelector,
};

use crate::agent::TurnState;
use crate::{
    Agent, AgentConfig, ChatError, CompletionCallback, ModerationGate, NoopTurnLoopHooks,
    TurnLoopHooks,
};

pub struct AgentBuilder {
    provider: Arc<dyn ModelProvider>,
    config: AgentConfig,
    moderation: Option<Arc<dyn ModerationProvider>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    catalog: Arc<ToolCatalog>,
    hooks: Arc<dyn TurnLoopHooks>,
    provider_hooks: Arc<dyn ProviderOperationHooks>,
    tool_hooks: Option<Arc<dyn ToolDispatchHooks>>,
    tool_callbacks: ToolCallbacks,
    on_complete: Option<Arc<CompletionCallback>>,
    history: Vec<HistoryEntry>,
    token_counter: Arc<dyn TokenCounter>,
    session_id: Option<SessionId>,
}

impl AgentBuilder {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            config: AgentConfig::default(),
            moderation: None,
            embedder: None,
            catalog: Arc::new(ToolCatalog::new()),
            hooks: Arc::new(NoopTurnLoopHooks),
            provider_hooks: Arc::new(NoopOperationHooks),
            tool_hooks: None,
            tool_callbacks: ToolCallbacks::default(),
            on_complete: None,
            history: Vec::new(),
            token_counter: Arc::new(HeuristicTokenCounter),
            session_id: None,
        }
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn moderation_provider(mut self, provider: Arc<dyn ModerationProvider>) -> Self {
        self.moderation = Some(provider);
        self
    }

    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(provider);
        self
    }

    pub fn tools(self, catalog: ToolCatalog) -> Self {
        self.shared_tools(Arc::new(catalog))
    }

    /// Shares one read-only catalog between agents.
    pub fn shared_tools(mut self, catalog: Arc<ToolCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn TurnLoopHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn provider_hooks(mut self, hooks: Arc<dyn ProviderOperationHooks>) -> Self {
        self.provider_hooks = hooks;
        self
    }

    pub fn tool_hooks(mut self, hooks: Arc<dyn ToolDispatchHooks>) -> Self {
        self.tool_hooks = Some(hooks);
        self
    }

    pub fn tool_callbacks(mut self, callbacks: ToolCallbacks) -> Self {
        self.tool_callbacks = callbacks;
        self
    }

    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_complete = Some(Arc::new(callback));
        self
    }

    pub fn token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.token_counter = counter;
        self
    }

    pub fn session_id(mut self, session_id: impl Into<SessionId>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Seeds memory. The history is moderated and validated by [`AgentBuilder::build`].
    pub fn history(mut self, history: impl IntoIterator<Item = Message>) -> Self {
        self.history
            .extend(history.into_iter().map(|message| HistoryEntry::from(&message)));
        self
    }

    pub fn history_entries(mut self, entries: impl IntoIterator<Item = HistoryEntry>) -> Self {
        self.history.extend(entries);
        self
    }

    pub async fn build(self) -> Result<Agent, ChatError> {
        self.config.validate()?;

        let gate = match (self.config.perform_moderation, self.moderation) {
            (true, Some(provider)) => ModerationGate::new(provider),
            (true, None) => {
                return Err(ChatError::configuration(
                    "moderation is enabled but no moderation provider was supplied",
                ));
            }
            (false, _) => ModerationGate::disabled(),
        };

        let mut selector = ToolSelector::new(self.config.selector_config()?);
        if let Some(embedder) = self.embedder {
            selector = selector.with_embedder(embedder);
        }

        let memory = shared(ConversationMemory::with_counter(
            self.config.memory_limits(),
            self.token_counter,
        ));

        let mut dispatcher = ToolDispatcher::new()
            .with_callbacks(self.tool_callbacks)
            .with_memory(Arc::clone(&memory));
        if let Some(hooks) = self.tool_hooks {
            dispatcher = dispatcher.with_hooks(hooks);
        }

        let session_id = self.session_id.unwrap_or_else(SessionId::generate);
        tracing::debug!(
            session = %session_id,
            provider = self.provider.name(),
            tools = self.catalog.len(),
            moderation = gate.is_enabled(),
            "agent assembled"
        );

        let mut agent = Agent {
            session_id,
            provider: self.provider,
            system_message: Message::system(self.config.system_message.clone()),
            config: self.config,
            gate,
            catalog: self.catalog,
            selector,
            dispatcher,
            memory,
            hooks: self.hooks,
            provider_hooks: self.provider_hooks,
            on_complete: self.on_complete,
            active_tools: ActiveToolSet::empty(),
            turn: TurnState::default(),
            last_response: None,
        };

        if !self.history.is_empty() {
            agent.load_history_entries(self.history).await?;
        }

        Ok(agent)
    }
}
