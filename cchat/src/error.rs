//! Turn-loop errors and classification.

use std::error::Error;
use std::fmt::{Display, Formatter};

use cmemory::{MemoryError, MemoryErrorKind};
use cprovider::ProviderError;
use ctooling::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    /// Malformed turn or history.
    Validation,
    /// Agent assembled with inconsistent settings, or flagged seed history.
    Configuration,
    /// Argument parsing, lookup, or execution failure of a requested tool.
    Tooling,
    /// The provider answered with a finish signal the loop does not understand.
    Protocol,
    /// Provider fault that could not be degraded to a user-visible message.
    Provider,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorPhase {
    Moderation,
    Selection,
    Provider,
    Tooling,
    Memory,
}

impl ChatErrorPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Moderation => "moderation",
            Self::Selection => "selection",
            Self::Provider => "provider",
            Self::Tooling => "tooling",
            Self::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    pub phase: Option<ChatErrorPhase>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            phase: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Validation, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Configuration, message)
    }

    pub fn tooling(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Tooling, message).with_phase(ChatErrorPhase::Tooling)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Protocol, message).with_phase(ChatErrorPhase::Provider)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Provider, message).with_phase(ChatErrorPhase::Provider)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Other, message)
    }

    pub fn with_phase(mut self, phase: ChatErrorPhase) -> Self {
        self.phase = Some(phase);
        self
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.phase {
            Some(phase) => write!(f, "{:?} during {}: {}", self.kind, phase.as_str(), self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ChatError {}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        ChatError::provider(value.to_string())
    }
}

impl From<ToolError> for ChatError {
    fn from(value: ToolError) -> Self {
        ChatError::tooling(value.to_string())
    }
}

impl From<MemoryError> for ChatError {
    fn from(value: MemoryError) -> Self {
        let kind = match value.kind {
            MemoryErrorKind::Validation => ChatErrorKind::Validation,
            MemoryErrorKind::Lock | MemoryErrorKind::Other => ChatErrorKind::Other,
        };
        ChatError::new(kind, value.message).with_phase(ChatErrorPhase::Memory)
    }
}
