//! Lifecycle hooks for the turn loop.
//!
//! ```rust
//! use cchat::{NoopTurnLoopHooks, TurnLoopHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn TurnLoopHooks) {}
//!
//! let hooks = NoopTurnLoopHooks;
//! assert_hooks_trait(&hooks);
//! ```

use cprovider::FinishReason;

/// How an ask ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The provider finished with a final answer.
    Answered,
    /// A tool result was routed straight to the user.
    SentDirectly,
    /// Moderation rejected the query.
    Refused,
    /// Scratch thoughts outgrew their ceiling.
    Overflow,
    /// The iteration cap was reached without a terminal signal.
    LoopLimit,
    /// The provider could not be reached or failed mid-answer.
    Unavailable,
    /// A tooling or protocol error aborted the ask.
    Failed,
}

impl Termination {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Answered => "answered",
            Self::SentDirectly => "sent_directly",
            Self::Refused => "refused",
            Self::Overflow => "overflow",
            Self::LoopLimit => "loop_limit",
            Self::Unavailable => "unavailable",
            Self::Failed => "failed",
        }
    }

    /// Answers produced by the provider or a tool, as opposed to fixed fallbacks.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Answered | Self::SentDirectly)
    }
}

pub trait TurnLoopHooks: Send + Sync {
    fn on_ask_start(&self, _query: &str, _streaming: bool) {}

    fn on_tools_selected(&self, _names: &[String]) {}

    fn on_round_start(&self, _iteration: usize, _model: &str, _tool_count: usize) {}

    fn on_round_finish(&self, _iteration: usize, _finish_reason: &FinishReason) {}

    fn on_ask_finish(&self, _termination: Termination, _iterations: usize) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTurnLoopHooks;

impl TurnLoopHooks for NoopTurnLoopHooks {}
