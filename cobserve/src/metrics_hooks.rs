//! Metrics-based hooks. Every series is prefixed `cirrus_`.
//!
//! ```rust
//! use cobserve::MetricsObservabilityHooks;
//! use cprovider::ProviderOperationHooks;
//!
//! fn accepts_provider_hooks(_hooks: &dyn ProviderOperationHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_provider_hooks(&hooks);
//! ```

use std::time::Duration;

use cchat::{Termination, TurnLoopHooks};
use cprovider::{FinishReason, ProviderError, ProviderOperationHooks};
use ctooling::{ToolArguments, ToolDispatchHooks, ToolError, ToolResultEnvelope};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ProviderOperationHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, provider: &str, operation: &str, _attempt: u32) {
        metrics::counter!(
            "cirrus_provider_attempt_start_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    fn on_retry_scheduled(
        &self,
        provider: &str,
        operation: &str,
        _attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "cirrus_provider_retry_scheduled_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "cirrus_provider_retry_delay_seconds",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(delay.as_secs_f64());
    }

    fn on_success(&self, provider: &str, operation: &str, attempts: u32) {
        metrics::counter!(
            "cirrus_provider_success_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "cirrus_provider_attempts_per_success",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }

    fn on_failure(&self, provider: &str, operation: &str, attempts: u32, error: &ProviderError) {
        metrics::counter!(
            "cirrus_provider_failure_total",
            "provider" => provider.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "cirrus_provider_attempts_per_failure",
            "provider" => provider.to_string(),
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }
}

impl ToolDispatchHooks for MetricsObservabilityHooks {
    fn on_invocation_start(&self, name: &str, _arguments: &ToolArguments) {
        metrics::counter!(
            "cirrus_tool_invocation_start_total",
            "tool_name" => name.to_string()
        )
        .increment(1);
    }

    fn on_invocation_success(
        &self,
        name: &str,
        envelope: Option<&ToolResultEnvelope>,
        elapsed: Duration,
    ) {
        let routing = match envelope {
            Some(envelope) if envelope.send_directly_to_user => "direct",
            Some(_) => "folded",
            None => "empty",
        };
        metrics::counter!(
            "cirrus_tool_invocation_success_total",
            "tool_name" => name.to_string(),
            "routing" => routing
        )
        .increment(1);
        metrics::histogram!(
            "cirrus_tool_invocation_duration_seconds",
            "tool_name" => name.to_string(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_invocation_failure(&self, name: &str, error: &ToolError, elapsed: Duration) {
        metrics::counter!(
            "cirrus_tool_invocation_failure_total",
            "tool_name" => name.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "cirrus_tool_invocation_duration_seconds",
            "tool_name" => name.to_string(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}

impl TurnLoopHooks for MetricsObservabilityHooks {
    fn on_ask_start(&self, _query: &str, streaming: bool) {
        metrics::counter!(
            "cirrus_ask_start_total",
            "mode" => if streaming { "stream" } else { "buffered" }
        )
        .increment(1);
    }

    fn on_tools_selected(&self, names: &[String]) {
        metrics::histogram!("cirrus_tools_selected").record(names.len() as f64);
    }

    fn on_round_start(&self, _iteration: usize, model: &str, _tool_count: usize) {
        metrics::counter!("cirrus_round_start_total", "model" => model.to_string()).increment(1);
    }

    fn on_round_finish(&self, _iteration: usize, finish_reason: &FinishReason) {
        metrics::counter!(
            "cirrus_round_finish_total",
            "finish_reason" => finish_reason.as_str().to_string()
        )
        .increment(1);
    }

    fn on_ask_finish(&self, termination: Termination, iterations: usize) {
        metrics::counter!(
            "cirrus_ask_finish_total",
            "termination" => termination.as_str()
        )
        .increment(1);
        metrics::histogram!(
            "cirrus_ask_iterations",
            "termination" => termination.as_str()
        )
        .record(iterations as f64);
    }
}
