//! Agent wiring over a single provider that also moderates and embeds.

use std::sync::Arc;

use crate::{
    AgentBuilder, AgentConfig, EmbeddingProvider, ModelProvider, ModerationProvider,
    SafeProviderHooks, SafeToolHooks, SafeTurnLoopHooks, TracingObservabilityHooks,
};

/// Attaches panic-isolated tracing hooks to every layer of the turn loop.
pub fn observed(builder: AgentBuilder) -> AgentBuilder {
    builder
        .hooks(Arc::new(SafeTurnLoopHooks::new(TracingObservabilityHooks)))
        .provider_hooks(Arc::new(SafeProviderHooks::new(TracingObservabilityHooks)))
        .tool_hooks(Arc::new(SafeToolHooks::new(TracingObservabilityHooks)))
}

/// Uses `provider` for completions, moderation, and tool-embedding lookups.
pub fn agent_with_provider<P>(provider: Arc<P>, config: AgentConfig) -> AgentBuilder
where
    P: ModelProvider + ModerationProvider + EmbeddingProvider + 'static,
{
    let model: Arc<dyn ModelProvider> = provider.clone();
    let moderation: Arc<dyn ModerationProvider> = provider.clone();
    let embedder: Arc<dyn EmbeddingProvider> = provider;

    observed(
        AgentBuilder::new(model)
            .config(config)
            .moderation_provider(moderation)
            .embedding_provider(embedder),
    )
}

/// Builds the OpenAI provider and wires it into an agent builder.
///
/// ```rust,no_run
/// use cirrus::{AgentConfig, ProviderBuildConfig, openai_agent};
///
/// async fn run() -> Result<(), Box<dyn std::error::Error>> {
///     let mut agent = openai_agent(ProviderBuildConfig::from_env(), AgentConfig::default())?
///         .build()
///         .await?;
///     println!("{}", agent.ask("Hello!").await?);
///     Ok(())
/// }
/// ```
#[cfg(feature = "provider-openai")]
pub fn openai_agent(
    provider: crate::ProviderBuildConfig,
    config: AgentConfig,
) -> Result<AgentBuilder, crate::ProviderError> {
    let provider = crate::build_openai_provider(provider)?;
    tracing::debug!(model = %config.model, "wiring OpenAI-backed agent");
    Ok(agent_with_provider(provider, config))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::{
        AgentConfig, BoxedDeltaStream, Embedding, EmbeddingProvider, MODERATION_FAIL_MESSAGE,
        Message, ModelProvider, ModelRequest, ModelResponse, ModerationProvider,
        ModerationVerdict, ProviderError, ProviderFuture,
    };

    use super::agent_with_provider;

    #[derive(Default)]
    struct AllInOneProvider {
        moderated: Mutex<Vec<String>>,
    }

    impl ModelProvider for AllInOneProvider {
        fn name(&self) -> &str {
            "all-in-one"
        }

        fn complete<'a>(
            &'a self,
            request: ModelRequest,
        ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
            Box::pin(async move { Ok(ModelResponse::stop(request.model, "done")) })
        }

        fn stream<'a>(
            &'a self,
            _request: ModelRequest,
        ) -> ProviderFuture<'a, Result<BoxedDeltaStream<'a>, ProviderError>> {
            Box::pin(async { Err(ProviderError::unavailable("streaming not scripted")) })
        }
    }

    impl ModerationProvider for AllInOneProvider {
        fn check<'a>(
            &'a self,
            text: &'a str,
        ) -> ProviderFuture<'a, Result<ModerationVerdict, ProviderError>> {
            Box::pin(async move {
                self.moderated
                    .lock()
                    .expect("moderated lock")
                    .push(text.to_string());
                if text.contains("forbidden") {
                    Ok(ModerationVerdict::flagged(["harassment"]))
                } else {
                    Ok(ModerationVerdict::safe())
                }
            })
        }
    }

    impl EmbeddingProvider for AllInOneProvider {
        fn embed<'a>(
            &'a self,
            _text: &'a str,
        ) -> ProviderFuture<'a, Result<Embedding, ProviderError>> {
            Box::pin(async { Ok(vec![1.0, 0.0]) })
        }
    }

    #[tokio::test]
    async fn one_provider_serves_completion_and_moderation() {
        let provider = Arc::new(AllInOneProvider::default());
        let mut agent = agent_with_provider(Arc::clone(&provider), AgentConfig::default())
            .build()
            .await
            .expect("agent should build");

        assert_eq!(agent.ask("hello").await.expect("ask should succeed"), "done");
        assert_eq!(
            agent.ask("something forbidden").await.expect("ask should succeed"),
            MODERATION_FAIL_MESSAGE
        );

        assert_eq!(
            provider.moderated.lock().expect("moderated lock").as_slice(),
            ["hello".to_string(), "something forbidden".to_string()]
        );
        assert_eq!(
            agent.chat_history().expect("history"),
            vec![Message::user("hello"), Message::assistant("done")]
        );
    }
}
