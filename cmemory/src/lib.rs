//! Conversational memory: a bounded, ordered, token-accounted transcript.

mod entry;
mod error;
mod memory;
mod token;

pub mod prelude {
    pub use crate::{
        ConversationMemory, DedupPolicy, HeuristicTokenCounter, HistoryEntry, MemoryError,
        MemoryErrorKind, MemoryLimits, SharedMemory, TokenCounter, WordTokenCounter, lock_memory,
        shared,
    };
}

pub use entry::HistoryEntry;
pub use error::{MemoryError, MemoryErrorKind};
pub use memory::{
    ConversationMemory, DEFAULT_MAX_MESSAGES, DEFAULT_MAX_TOKENS, DedupPolicy, MemoryLimits,
    SharedMemory, lock_memory, shared,
};
pub use token::{HeuristicTokenCounter, TokenCounter, WordTokenCounter};
