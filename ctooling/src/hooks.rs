//! Lifecycle hooks and callbacks fired around tool dispatch.
//!
//! ```rust
//! use ctooling::{NoopToolDispatchHooks, ToolDispatchHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn ToolDispatchHooks) {}
//!
//! let hooks = NoopToolDispatchHooks;
//! assert_hooks_trait(&hooks);
//! ```

use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use crate::{ToolArguments, ToolError, ToolResultEnvelope};

pub trait ToolDispatchHooks: Send + Sync {
    fn on_invocation_start(&self, _name: &str, _arguments: &ToolArguments) {}

    fn on_invocation_success(
        &self,
        _name: &str,
        _envelope: Option<&ToolResultEnvelope>,
        _elapsed: Duration,
    ) {
    }

    fn on_invocation_failure(&self, _name: &str, _error: &ToolError, _elapsed: Duration) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopToolDispatchHooks;

impl ToolDispatchHooks for NoopToolDispatchHooks {}

pub type StartCallback = dyn Fn(&str, &ToolArguments) + Send + Sync;
pub type FinishCallback = dyn Fn(&str) + Send + Sync;

/// Plain closures fired synchronously around each successful invocation.
#[derive(Clone, Default)]
pub struct ToolCallbacks {
    on_start: Option<Arc<StartCallback>>,
    on_finish: Option<Arc<FinishCallback>>,
}

impl ToolCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &ToolArguments) + Send + Sync + 'static,
    {
        self.on_start = Some(Arc::new(callback));
        self
    }

    pub fn on_finish<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_finish = Some(Arc::new(callback));
        self
    }

    pub(crate) fn fire_start(&self, name: &str, arguments: &ToolArguments) {
        if let Some(callback) = &self.on_start {
            callback(name, arguments);
        }
    }

    pub(crate) fn fire_finish(&self, name: &str) {
        if let Some(callback) = &self.on_finish {
            callback(name);
        }
    }
}

impl Debug for ToolCallbacks {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCallbacks")
            .field("on_start", &self.on_start.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .finish()
    }
}
