//! Values produced by an ask.

use std::pin::Pin;

use futures_core::Stream;

use crate::{ChatError, EventMarker, Termination};

/// Invoked with the final answer of every ask that ends in a real answer.
pub type CompletionCallback = dyn Fn(&str) + Send + Sync;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    pub text: String,
    pub termination: Termination,
    /// Provider rounds used.
    pub iterations: usize,
}

/// One item of a streamed ask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentOutput {
    Content(String),
    Event(EventMarker),
    /// Always the last item of a stream that did not fail.
    Done(Termination),
}

impl AgentOutput {
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Content(content) => Some(content),
            _ => None,
        }
    }

    /// Wire form for callers that forward a single text channel.
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Content(content) => Some(content.clone()),
            Self::Event(marker) => Some(marker.render()),
            Self::Done(_) => None,
        }
    }
}

pub type AgentOutputStream<'a> =
    Pin<Box<dyn Stream<Item = Result<AgentOutput, ChatError>> + Send + 'a>>;
