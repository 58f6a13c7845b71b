//! Safety gate in front of the turn loop.
//!
//! A moderation provider that cannot be reached counts as a flag: an outage
//! must never let text through unchecked.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use cprovider::{Message, ModerationProvider};

#[derive(Clone, Default)]
pub struct ModerationGate {
    provider: Option<Arc<dyn ModerationProvider>>,
}

impl Debug for ModerationGate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModerationGate")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl ModerationGate {
    pub fn new(provider: Arc<dyn ModerationProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// A gate that lets everything through.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn is_safe(&self, text: &str) -> bool {
        let Some(provider) = &self.provider else {
            return true;
        };

        match provider.check(text).await {
            Ok(verdict) if verdict.flagged => {
                tracing::info!(categories = ?verdict.categories, "text flagged by moderation");
                false
            }
            Ok(_) => true,
            Err(error) => {
                tracing::warn!(error = %error, "moderation check failed; treating text as flagged");
                false
            }
        }
    }

    /// Checks a whole transcript in one request.
    pub async fn is_history_safe(&self, history: &[Message]) -> bool {
        if history.is_empty() || !self.is_enabled() {
            return true;
        }

        let joined = history
            .iter()
            .map(Message::text)
            .collect::<Vec<_>>()
            .join(" ");
        self.is_safe(&joined).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use cprovider::{ModerationVerdict, ProviderError, ProviderFuture};

    use super::*;

    #[derive(Default)]
    struct ScriptedModeration {
        flag_containing: Option<String>,
        fail: bool,
        seen: Mutex<Vec<String>>,
    }

    impl ModerationProvider for ScriptedModeration {
        fn check<'a>(
            &'a self,
            text: &'a str,
        ) -> ProviderFuture<'a, Result<ModerationVerdict, ProviderError>> {
            Box::pin(async move {
                self.seen.lock().expect("seen lock").push(text.to_string());
                if self.fail {
                    return Err(ProviderError::transport("connection reset"));
                }
                match &self.flag_containing {
                    Some(needle) if text.contains(needle.as_str()) => {
                        Ok(ModerationVerdict::flagged(["violence"]))
                    }
                    _ => Ok(ModerationVerdict::safe()),
                }
            })
        }
    }

    #[tokio::test]
    async fn disabled_gate_passes_everything() {
        let gate = ModerationGate::disabled();

        assert!(gate.is_safe("anything").await);
        assert!(gate.is_history_safe(&[Message::user("anything")]).await);
    }

    #[tokio::test]
    async fn flagged_text_is_unsafe() {
        let provider = Arc::new(ScriptedModeration {
            flag_containing: Some("bad".to_string()),
            ..ScriptedModeration::default()
        });
        let gate = ModerationGate::new(provider);

        assert!(gate.is_safe("good words").await);
        assert!(!gate.is_safe("bad words").await);
    }

    #[tokio::test]
    async fn transport_failure_fails_closed() {
        let provider = Arc::new(ScriptedModeration {
            fail: true,
            ..ScriptedModeration::default()
        });
        let gate = ModerationGate::new(provider);

        assert!(!gate.is_safe("hello").await);
    }

    #[tokio::test]
    async fn history_is_checked_as_one_joined_text() {
        let provider = Arc::new(ScriptedModeration::default());
        let gate = ModerationGate::new(provider.clone());

        let history = vec![Message::user("hello"), Message::assistant("hi there")];
        assert!(gate.is_history_safe(&history).await);

        let seen = provider.seen.lock().expect("seen lock");
        assert_eq!(seen.as_slice(), ["hello hi there".to_string()]);
    }
}
