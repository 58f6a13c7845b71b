//! Resolves a requested tool, invokes it, and normalizes its result.

use std::sync::Arc;
use std::time::Instant;

use cmemory::SharedMemory;

use crate::{
    ActiveToolSet, NoopToolDispatchHooks, ToolCallbacks, ToolDispatchHooks, ToolError,
    ToolResultEnvelope, parse_arguments,
};

#[derive(Clone)]
pub struct ToolDispatcher {
    hooks: Arc<dyn ToolDispatchHooks>,
    callbacks: ToolCallbacks,
    memory: Option<SharedMemory>,
}

impl Default for ToolDispatcher {
    fn default() -> Self {
        Self {
            hooks: Arc::new(NoopToolDispatchHooks),
            callbacks: ToolCallbacks::default(),
            memory: None,
        }
    }
}

impl ToolDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolDispatchHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_callbacks(mut self, callbacks: ToolCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Memory handed to handlers that declare they need it.
    pub fn with_memory(mut self, memory: SharedMemory) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Invokes `name` from the active set.
    ///
    /// `Ok(None)` means the tool returned nothing. Argument, lookup, and tool
    /// failures are returned as errors tagged with the tool name.
    pub fn invoke(
        &self,
        active: &ActiveToolSet,
        name: &str,
        raw_arguments: &str,
    ) -> Result<Option<ToolResultEnvelope>, ToolError> {
        let arguments =
            parse_arguments(raw_arguments).map_err(|err| err.with_tool_name(name))?;

        self.hooks.on_invocation_start(name, &arguments);
        self.callbacks.fire_start(name, &arguments);
        let started = Instant::now();

        let outcome = active
            .get(name)
            .ok_or_else(|| ToolError::not_found(format!("tool '{name}' is not active")))
            .and_then(|descriptor| {
                descriptor
                    .invocable()
                    .invoke(&arguments, self.memory.as_ref())
            })
            .and_then(|output| output.into_envelope())
            .map_err(|err| err.with_tool_name(name));

        match outcome {
            Ok(envelope) => {
                let envelope = envelope.map(|envelope| envelope.stamp(name, raw_arguments));
                self.hooks
                    .on_invocation_success(name, envelope.as_ref(), started.elapsed());
                self.callbacks.fire_finish(name);
                tracing::debug!(
                    tool = name,
                    has_content = envelope
                        .as_ref()
                        .is_some_and(|envelope| envelope.foldable_content().is_some()),
                    "tool invocation finished"
                );
                Ok(envelope)
            }
            Err(error) => {
                self.hooks
                    .on_invocation_failure(name, &error, started.elapsed());
                if error.is_request_error() {
                    tracing::debug!(tool = name, error = %error, "tool call rejected");
                } else {
                    tracing::warn!(tool = name, error = %error, "tool invocation failed");
                }
                Err(error)
            }
        }
    }
}
