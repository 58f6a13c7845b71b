//! Tracing-based hooks for provider attempts, tool dispatch and turn-loop rounds.
//!
//! ```rust
//! use cchat::TurnLoopHooks;
//! use cobserve::TracingObservabilityHooks;
//!
//! fn accepts_turn_hooks(_hooks: &dyn TurnLoopHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_turn_hooks(&hooks);
//! ```

use std::time::Duration;

use cchat::{Termination, TurnLoopHooks};
use cprovider::{FinishReason, ProviderError, ProviderOperationHooks};
use ctooling::{ToolArguments, ToolDispatchHooks, ToolError, ToolResultEnvelope};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ProviderOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, provider: &str, operation: &str, attempt: u32) {
        tracing::info!(
            phase = "provider",
            event = "attempt_start",
            provider,
            operation,
            attempt
        );
    }

    fn on_retry_scheduled(
        &self,
        provider: &str,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        tracing::warn!(
            phase = "provider",
            event = "retry_scheduled",
            provider,
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_success(&self, provider: &str, operation: &str, attempts: u32) {
        tracing::info!(
            phase = "provider",
            event = "success",
            provider,
            operation,
            attempts
        );
    }

    fn on_failure(&self, provider: &str, operation: &str, attempts: u32, error: &ProviderError) {
        tracing::error!(
            phase = "provider",
            event = "failure",
            provider,
            operation,
            attempts,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl ToolDispatchHooks for TracingObservabilityHooks {
    fn on_invocation_start(&self, name: &str, arguments: &ToolArguments) {
        tracing::info!(
            phase = "tool",
            event = "invocation_start",
            tool_name = name,
            argument_keys = ?arguments.keys().collect::<Vec<_>>()
        );
    }

    fn on_invocation_success(
        &self,
        name: &str,
        envelope: Option<&ToolResultEnvelope>,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "tool",
            event = "invocation_success",
            tool_name = name,
            has_result = envelope.is_some(),
            send_directly = envelope.is_some_and(|envelope| envelope.send_directly_to_user),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_invocation_failure(&self, name: &str, error: &ToolError, elapsed: Duration) {
        tracing::error!(
            phase = "tool",
            event = "invocation_failure",
            tool_name = name,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            error = %error
        );
    }
}

impl TurnLoopHooks for TracingObservabilityHooks {
    fn on_ask_start(&self, query: &str, streaming: bool) {
        tracing::info!(
            phase = "turn",
            event = "ask_start",
            query_chars = query.chars().count(),
            streaming
        );
    }

    fn on_tools_selected(&self, names: &[String]) {
        tracing::info!(phase = "turn", event = "tools_selected", tools = ?names);
    }

    fn on_round_start(&self, iteration: usize, model: &str, tool_count: usize) {
        tracing::info!(
            phase = "turn",
            event = "round_start",
            iteration,
            model,
            tool_count
        );
    }

    fn on_round_finish(&self, iteration: usize, finish_reason: &FinishReason) {
        tracing::info!(
            phase = "turn",
            event = "round_finish",
            iteration,
            finish_reason = finish_reason.as_str()
        );
    }

    fn on_ask_finish(&self, termination: Termination, iterations: usize) {
        if termination.is_success() {
            tracing::info!(
                phase = "turn",
                event = "ask_finish",
                termination = termination.as_str(),
                iterations
            );
        } else {
            tracing::warn!(
                phase = "turn",
                event = "ask_finish",
                termination = termination.as_str(),
                iterations
            );
        }
    }
}
