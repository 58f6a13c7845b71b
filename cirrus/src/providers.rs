//! OpenAI provider construction for facade consumers.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::{OpenAiHttpTransport, OpenAiProvider, ProviderError, SecretString};

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone)]
pub struct ProviderBuildConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub embedding_model: Option<String>,
    pub timeout: Duration,
}

impl Default for ProviderBuildConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            embedding_model: None,
            timeout: Duration::from_secs(90),
        }
    }
}

impl ProviderBuildConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Reads the key from `OPENAI_API_KEY` at build time.
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn resolve_api_key(&self) -> Result<SecretString, ProviderError> {
        let api_key = match &self.api_key {
            Some(api_key) => api_key.trim().to_string(),
            None => std::env::var(API_KEY_ENV)
                .map(|value| value.trim().to_string())
                .unwrap_or_default(),
        };

        if api_key.is_empty() {
            return Err(ProviderError::authentication(format!(
                "OpenAI API key must be configured or set in {API_KEY_ENV}"
            )));
        }
        Ok(SecretString::new(api_key))
    }
}

/// One provider instance serves completions, moderation, and embeddings.
pub fn build_openai_provider(
    config: ProviderBuildConfig,
) -> Result<Arc<OpenAiProvider>, ProviderError> {
    let api_key = config.resolve_api_key()?;
    let http = Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|err| ProviderError::transport(err.to_string()))?;

    let mut transport = OpenAiHttpTransport::new(http, api_key);
    if let Some(base_url) = config.base_url {
        transport = transport.with_base_url(base_url);
    }

    let mut provider = OpenAiProvider::new(Arc::new(transport));
    if let Some(model) = config.embedding_model {
        provider = provider.with_embedding_model(model);
    }
    Ok(Arc::new(provider))
}

pub fn build_provider_from_api_key(
    api_key: impl Into<String>,
) -> Result<Arc<OpenAiProvider>, ProviderError> {
    build_openai_provider(ProviderBuildConfig::new(api_key))
}
