//! Per-turn tool relevance selection.
//!
//! Activation order is an ordered union where the first occurrence wins:
//! always-use names, pattern matches on the query, nearest embeddings to the
//! recent conversation, then pattern matches on that conversation text. The
//! resulting list is materialized against the catalog up to a token budget.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use cprovider::{Embedding, EmbeddingProvider, Message};
use regex::Regex;
use serde::Deserialize;

use crate::{ActiveToolSet, ToolCatalog, ToolError};

pub const DEFAULT_K_NEAREST: usize = 3;
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.5;
pub const DEFAULT_TOOL_TOKEN_BUDGET: usize = 2000;

/// Regex that activates a list of tools when it matches.
#[derive(Debug, Clone)]
pub struct PatternGroup {
    pattern: Regex,
    tools: Vec<String>,
}

impl PatternGroup {
    pub fn new<I, S>(pattern: &str, tools: I) -> Result<Self, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pattern = Regex::new(pattern).map_err(|err| {
            ToolError::configuration(format!("invalid tool pattern '{pattern}': {err}"))
        })?;

        Ok(Self {
            pattern,
            tools: tools.into_iter().map(Into::into).collect(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Serializable form of a [`PatternGroup`], compiled by [`PatternGroupSpec::compile`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PatternGroupSpec {
    pub pattern: String,
    pub tools: Vec<String>,
}

impl PatternGroupSpec {
    pub fn compile(&self) -> Result<PatternGroup, ToolError> {
        PatternGroup::new(&self.pattern, self.tools.iter().cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolEmbedding {
    pub name: String,
    pub embedding: Embedding,
}

impl ToolEmbedding {
    pub fn new(name: impl Into<String>, embedding: Embedding) -> Self {
        Self {
            name: name.into(),
            embedding,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectorConfig {
    pub always_use: Vec<String>,
    pub pattern_groups: Vec<PatternGroup>,
    pub embeddings: Vec<ToolEmbedding>,
    pub k_nearest: usize,
    pub min_similarity: f32,
    /// Zero means unlimited.
    pub token_budget: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            always_use: Vec::new(),
            pattern_groups: Vec::new(),
            embeddings: Vec::new(),
            k_nearest: DEFAULT_K_NEAREST,
            min_similarity: DEFAULT_MIN_SIMILARITY,
            token_budget: DEFAULT_TOOL_TOKEN_BUDGET,
        }
    }
}

impl SelectorConfig {
    /// Without patterns or embeddings every catalog tool is a candidate.
    pub fn selects_everything(&self) -> bool {
        self.pattern_groups.is_empty() && self.embeddings.is_empty()
    }
}

#[derive(Clone, Default)]
pub struct ToolSelector {
    config: SelectorConfig,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
}

impl Debug for ToolSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSelector")
            .field("config", &self.config)
            .field("embedder", &self.embedder.is_some())
            .finish()
    }
}

impl ToolSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self {
            config,
            embedder: None,
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn always_use(&self) -> &[String] {
        &self.config.always_use
    }

    /// Ordered, de-duplicated candidate names before catalog resolution.
    pub async fn candidate_names(
        &self,
        catalog: &ToolCatalog,
        query: &str,
        recent_history: &[Message],
    ) -> Vec<String> {
        if self.config.selects_everything() {
            return catalog.names().map(ToString::to_string).collect();
        }

        let mut names = Vec::new();
        extend_unique(&mut names, self.config.always_use.iter().cloned());
        extend_unique(&mut names, self.pattern_matches(query));

        let context = recent_context(recent_history, query);
        extend_unique(&mut names, self.nearest_by_embedding(&context).await);
        extend_unique(&mut names, self.pattern_matches(&context));

        names
    }

    /// Chooses the active tool set for one ask.
    pub async fn select(
        &self,
        catalog: &ToolCatalog,
        query: &str,
        recent_history: &[Message],
    ) -> ActiveToolSet {
        if catalog.is_empty() {
            return ActiveToolSet::empty();
        }

        let names = self.candidate_names(catalog, query, recent_history).await;
        let budget = self.config.token_budget;
        let mut selected = Vec::new();
        let mut token_total = 0_usize;

        for name in &names {
            let Some(descriptor) = catalog.get(name) else {
                continue;
            };
            selected.push(descriptor.clone());
            token_total += descriptor.token_cost();
            if budget > 0 && token_total >= budget {
                break;
            }
        }

        tracing::info!(
            candidates = ?names,
            selected = ?selected.iter().map(|tool| tool.name()).collect::<Vec<_>>(),
            token_total,
            "selected tools for turn"
        );

        ActiveToolSet::new(selected)
    }

    fn pattern_matches(&self, text: &str) -> Vec<String> {
        self.config
            .pattern_groups
            .iter()
            .filter(|group| group.is_match(text))
            .flat_map(|group| group.tools.iter().cloned())
            .collect()
    }

    async fn nearest_by_embedding(&self, text: &str) -> Vec<String> {
        if self.config.embeddings.is_empty() || self.config.k_nearest == 0 {
            return Vec::new();
        }

        let Some(embedder) = &self.embedder else {
            tracing::warn!("tool embeddings configured without an embedding provider");
            return Vec::new();
        };

        let query = match embedder.embed(text).await {
            Ok(query) => query,
            Err(error) => {
                tracing::warn!(error = %error, "embedding tool query failed; skipping semantic selection");
                return Vec::new();
            }
        };

        let mut scored = self
            .config
            .embeddings
            .iter()
            .map(|tool| (embedder.similarity(&query, &tool.embedding), tool.name.as_str()))
            .filter(|(score, _)| *score >= self.config.min_similarity)
            .collect::<Vec<_>>();
        scored.sort_by(|left, right| right.0.total_cmp(&left.0));

        scored
            .into_iter()
            .take(self.config.k_nearest)
            .map(|(_, name)| name.to_string())
            .collect()
    }
}

/// The last two turns followed by the query, space-joined.
fn recent_context(history: &[Message], query: &str) -> String {
    let start = history.len().saturating_sub(2);
    history[start..]
        .iter()
        .map(Message::text)
        .chain(std::iter::once(query))
        .collect::<Vec<_>>()
        .join(" ")
}

fn extend_unique(names: &mut Vec<String>, candidates: impl IntoIterator<Item = String>) {
    for candidate in candidates {
        if !names.contains(&candidate) {
            names.push(candidate);
        }
    }
}
