use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use cchat::{Termination, TurnLoopHooks};
use cprovider::{FinishReason, ProviderError, ProviderOperationHooks};
use ctooling::{ToolArguments, ToolDispatchHooks, ToolError, ToolResultEnvelope};

/// Runs provider hooks with panics contained.
pub struct SafeProviderHooks<H> {
    inner: H,
}

impl<H> SafeProviderHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ProviderOperationHooks for SafeProviderHooks<H>
where
    H: ProviderOperationHooks,
{
    fn on_attempt_start(&self, provider: &str, operation: &str, attempt: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_attempt_start(provider, operation, attempt)
        }));
    }

    fn on_retry_scheduled(
        &self,
        provider: &str,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_retry_scheduled(provider, operation, attempt, delay, error)
        }));
    }

    fn on_success(&self, provider: &str, operation: &str, attempts: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_success(provider, operation, attempts)
        }));
    }

    fn on_failure(&self, provider: &str, operation: &str, attempts: u32, error: &ProviderError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_failure(provider, operation, attempts, error)
        }));
    }
}

pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ToolDispatchHooks for SafeToolHooks<H>
where
    H: ToolDispatchHooks,
{
    fn on_invocation_start(&self, name: &str, arguments: &ToolArguments) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_invocation_start(name, arguments)
        }));
    }

    fn on_invocation_success(
        &self,
        name: &str,
        envelope: Option<&ToolResultEnvelope>,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_invocation_success(name, envelope, elapsed)
        }));
    }

    fn on_invocation_failure(&self, name: &str, error: &ToolError, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_invocation_failure(name, error, elapsed)
        }));
    }
}

pub struct SafeTurnLoopHooks<H> {
    inner: H,
}

impl<H> SafeTurnLoopHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> TurnLoopHooks for SafeTurnLoopHooks<H>
where
    H: TurnLoopHooks,
{
    fn on_ask_start(&self, query: &str, streaming: bool) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_ask_start(query, streaming)));
    }

    fn on_tools_selected(&self, names: &[String]) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_tools_selected(names)));
    }

    fn on_round_start(&self, iteration: usize, model: &str, tool_count: usize) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_round_start(iteration, model, tool_count)
        }));
    }

    fn on_round_finish(&self, iteration: usize, finish_reason: &FinishReason) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_round_finish(iteration, finish_reason)
        }));
    }

    fn on_ask_finish(&self, termination: Termination, iterations: usize) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_ask_finish(termination, iterations)
        }));
    }
}
