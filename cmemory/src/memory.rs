//! Bounded, token-accounted conversation transcript.
//!
//! ```rust
//! use std::sync::Arc;
//! use cmemory::{ConversationMemory, MemoryLimits, WordTokenCounter};
//! use cprovider::Message;
//!
//! let mut memory = ConversationMemory::with_counter(
//!     MemoryLimits::new(Some(10), Some(2)),
//!     Arc::new(WordTokenCounter),
//! );
//! memory.append(Message::user("hello")).expect("append");
//! memory.append(Message::user("world")).expect("append");
//! memory.append(Message::user("!")).expect("append");
//!
//! let texts = memory.turns().iter().map(|m| m.text().to_string()).collect::<Vec<_>>();
//! assert_eq!(texts, vec!["world", "!"]);
//! assert_eq!(memory.total_tokens(), 2);
//! ```

use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

use cprovider::Message;

use crate::{HeuristicTokenCounter, HistoryEntry, MemoryError, TokenCounter};

pub const DEFAULT_MAX_TOKENS: usize = 2000;
pub const DEFAULT_MAX_MESSAGES: usize = 20;

/// Memory handle shared between the turn loop and memory-aware tools.
pub type SharedMemory = Arc<Mutex<ConversationMemory>>;

pub fn shared(memory: ConversationMemory) -> SharedMemory {
    Arc::new(Mutex::new(memory))
}

pub fn lock_memory(memory: &SharedMemory) -> Result<MutexGuard<'_, ConversationMemory>, MemoryError> {
    memory
        .lock()
        .map_err(|_| MemoryError::lock("conversation memory lock poisoned"))
}

/// `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLimits {
    pub max_tokens: Option<usize>,
    pub max_messages: Option<usize>,
}

impl MemoryLimits {
    pub fn new(max_tokens: Option<usize>, max_messages: Option<usize>) -> Self {
        Self {
            max_tokens,
            max_messages,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None, None)
    }
}

impl Default for MemoryLimits {
    fn default() -> Self {
        Self::new(Some(DEFAULT_MAX_TOKENS), Some(DEFAULT_MAX_MESSAGES))
    }
}

/// How `set_history` collapses consecutive duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupPolicy {
    /// Keep only the first of consecutive entries sharing a role.
    #[default]
    ByRole,
    /// Keep only the first of consecutive entries identical in role and content.
    ByContent,
}

impl DedupPolicy {
    fn is_duplicate(self, previous: &Message, next: &Message) -> bool {
        match self {
            Self::ByRole => previous.role == next.role,
            Self::ByContent => previous.role == next.role && previous.content == next.content,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredTurn {
    message: Message,
    tokens: usize,
}

pub struct ConversationMemory {
    turns: VecDeque<StoredTurn>,
    total_tokens: usize,
    limits: MemoryLimits,
    counter: Arc<dyn TokenCounter>,
}

impl Debug for ConversationMemory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationMemory")
            .field("len", &self.turns.len())
            .field("total_tokens", &self.total_tokens)
            .field("limits", &self.limits)
            .finish()
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(MemoryLimits::default())
    }
}

impl ConversationMemory {
    pub fn new(limits: MemoryLimits) -> Self {
        Self::with_counter(limits, Arc::new(HeuristicTokenCounter))
    }

    pub fn with_counter(limits: MemoryLimits, counter: Arc<dyn TokenCounter>) -> Self {
        Self {
            turns: VecDeque::new(),
            total_tokens: 0,
            limits,
            counter,
        }
    }

    pub fn with_history(
        limits: MemoryLimits,
        history: impl IntoIterator<Item = Message>,
    ) -> Result<Self, MemoryError> {
        let mut memory = Self::new(limits);
        memory.set_history(history, DedupPolicy::default())?;
        Ok(memory)
    }

    pub fn token_counter(&self) -> Arc<dyn TokenCounter> {
        Arc::clone(&self.counter)
    }

    pub fn limits(&self) -> MemoryLimits {
        self.limits
    }

    /// Appends one turn and trims to the configured limits.
    ///
    /// A turn without content is rejected. Whitespace-only content is dropped silently.
    pub fn append(&mut self, message: Message) -> Result<(), MemoryError> {
        let Some(content) = message.content.as_deref() else {
            return Err(MemoryError::validation(format!(
                "{} turn is missing content",
                message.role
            )));
        };

        if content.trim().is_empty() {
            return Ok(());
        }

        let tokens = self.counter.count_text(content);
        self.turns.push_back(StoredTurn { message, tokens });
        self.total_tokens += tokens;
        self.trim();
        Ok(())
    }

    pub fn append_entry(&mut self, entry: HistoryEntry) -> Result<(), MemoryError> {
        self.append(entry.into_message()?)
    }

    /// Evicts from the oldest end until both limits hold.
    pub fn trim(&mut self) {
        let mut evicted = 0_usize;
        while self.exceeds_limits() {
            let Some(turn) = self.turns.pop_front() else {
                break;
            };
            self.total_tokens -= turn.tokens;
            evicted += 1;
        }

        if evicted > 0 {
            tracing::debug!(
                evicted,
                remaining = self.turns.len(),
                total_tokens = self.total_tokens,
                "trimmed conversation memory"
            );
        }
    }

    fn exceeds_limits(&self) -> bool {
        let over_tokens = self
            .limits
            .max_tokens
            .is_some_and(|max| self.total_tokens > max);
        let over_messages = self
            .limits
            .max_messages
            .is_some_and(|max| self.turns.len() > max);
        over_tokens || over_messages
    }

    /// Replaces the transcript wholesale, collapsing consecutive duplicates first.
    ///
    /// Every turn is validated before the current transcript is touched.
    pub fn set_history(
        &mut self,
        history: impl IntoIterator<Item = Message>,
        policy: DedupPolicy,
    ) -> Result<(), MemoryError> {
        let mut kept: Vec<Message> = Vec::new();
        for message in history {
            if message.content.is_none() {
                return Err(MemoryError::validation(format!(
                    "{} turn is missing content",
                    message.role
                )));
            }
            if kept
                .last()
                .is_some_and(|previous| policy.is_duplicate(previous, &message))
            {
                continue;
            }
            kept.push(message);
        }

        self.clear();
        for message in kept {
            self.append(message)?;
        }
        Ok(())
    }

    pub fn set_history_entries(
        &mut self,
        entries: impl IntoIterator<Item = HistoryEntry>,
        policy: DedupPolicy,
    ) -> Result<(), MemoryError> {
        let history = entries
            .into_iter()
            .map(HistoryEntry::into_message)
            .collect::<Result<Vec<_>, _>>()?;
        self.set_history(history, policy)
    }

    /// Updates the given limits and re-trims. `None` leaves that limit unchanged.
    pub fn resize(&mut self, max_tokens: Option<usize>, max_messages: Option<usize>) {
        if max_tokens.is_some() {
            self.limits.max_tokens = max_tokens;
        }
        if max_messages.is_some() {
            self.limits.max_messages = max_messages;
        }
        self.trim();
    }

    /// Replaces both limits, including lifting them with `None`.
    pub fn set_limits(&mut self, limits: MemoryLimits) {
        self.limits = limits;
        self.trim();
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.total_tokens = 0;
    }

    /// Copy of the retained turns, oldest first.
    pub fn turns(&self) -> Vec<Message> {
        self.turns.iter().map(|turn| turn.message.clone()).collect()
    }

    pub fn last(&self) -> Option<&Message> {
        self.turns.back().map(|turn| &turn.message)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    /// Transcript rendered as `role: content` lines.
    pub fn history_as_text(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("{}: {}", turn.message.role, turn.message.text()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
