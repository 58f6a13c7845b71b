//! Invocable variants backing catalog entries.
//!
//! ```rust
//! use ctooling::{Invocable, ToolArguments, ToolOutput, ToolResultEnvelope, required_string};
//!
//! let invocable = Invocable::function(|args: &ToolArguments| {
//!     let location = required_string(args, "location")?;
//!     Ok(ToolResultEnvelope::with_content(format!("sunny in {location}")).into())
//! });
//!
//! let mut args = ToolArguments::new();
//! args.insert("location".into(), "Tokyo".into());
//! let output = invocable.invoke(&args, None).expect("function should succeed");
//! assert!(matches!(output, ToolOutput::Envelope(_)));
//! ```

use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};

use cmemory::SharedMemory;

use crate::{ToolArguments, ToolError, ToolOutput};

/// Stateful tool implementation, either prepared once or built per call by a factory.
pub trait ToolHandler: Send {
    fn call(&mut self, arguments: &ToolArguments) -> Result<ToolOutput, ToolError>;

    /// Handlers returning `true` receive the session memory before each call.
    fn requires_memory(&self) -> bool {
        false
    }

    fn set_memory(&mut self, _memory: SharedMemory) {}
}

pub type ToolFn = dyn Fn(&ToolArguments) -> Result<ToolOutput, ToolError> + Send + Sync;
pub type HandlerFactory = dyn Fn() -> Box<dyn ToolHandler> + Send + Sync;

#[derive(Clone)]
pub enum Invocable {
    Function(Arc<ToolFn>),
    /// One prepared instance reused across calls.
    Handler(Arc<Mutex<Box<dyn ToolHandler>>>),
    /// A fresh instance per call.
    Factory(Arc<HandlerFactory>),
}

impl Debug for Invocable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::Function(_) => "Function",
            Self::Handler(_) => "Handler",
            Self::Factory(_) => "Factory",
        };
        f.debug_tuple("Invocable").field(&kind).finish()
    }
}

impl Invocable {
    pub fn function<F>(function: F) -> Self
    where
        F: Fn(&ToolArguments) -> Result<ToolOutput, ToolError> + Send + Sync + 'static,
    {
        Self::Function(Arc::new(function))
    }

    pub fn handler<H>(handler: H) -> Self
    where
        H: ToolHandler + 'static,
    {
        Self::Handler(Arc::new(Mutex::new(Box::new(handler))))
    }

    pub fn factory<F, H>(factory: F) -> Self
    where
        F: Fn() -> H + Send + Sync + 'static,
        H: ToolHandler + 'static,
    {
        Self::Factory(Arc::new(move || Box::new(factory()) as Box<dyn ToolHandler>))
    }

    pub fn invoke(
        &self,
        arguments: &ToolArguments,
        memory: Option<&SharedMemory>,
    ) -> Result<ToolOutput, ToolError> {
        match self {
            Self::Function(function) => function(arguments),
            Self::Handler(handler) => {
                let mut handler = handler
                    .lock()
                    .map_err(|_| ToolError::execution("tool handler lock poisoned"))?;
                call_handler(handler.as_mut(), arguments, memory)
            }
            Self::Factory(factory) => {
                let mut handler = factory();
                call_handler(handler.as_mut(), arguments, memory)
            }
        }
    }
}

fn call_handler(
    handler: &mut dyn ToolHandler,
    arguments: &ToolArguments,
    memory: Option<&SharedMemory>,
) -> Result<ToolOutput, ToolError> {
    if handler.requires_memory()
        && let Some(memory) = memory
    {
        handler.set_memory(Arc::clone(memory));
    }
    handler.call(arguments)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cmemory::{ConversationMemory, MemoryLimits, lock_memory, shared};
    use cprovider::Message;

    use super::*;

    #[derive(Default)]
    struct Counter {
        calls: usize,
    }

    impl ToolHandler for Counter {
        fn call(&mut self, _arguments: &ToolArguments) -> Result<ToolOutput, ToolError> {
            self.calls += 1;
            Ok(ToolOutput::Text(self.calls.to_string()))
        }
    }

    #[derive(Default)]
    struct HistoryLength {
        memory: Option<SharedMemory>,
    }

    impl ToolHandler for HistoryLength {
        fn call(&mut self, _arguments: &ToolArguments) -> Result<ToolOutput, ToolError> {
            let memory = self
                .memory
                .as_ref()
                .ok_or_else(|| ToolError::execution("memory was not injected"))?;
            let len = lock_memory(memory)
                .map_err(|err| ToolError::execution(err.message))?
                .len();
            Ok(ToolOutput::Text(len.to_string()))
        }

        fn requires_memory(&self) -> bool {
            true
        }

        fn set_memory(&mut self, memory: SharedMemory) {
            self.memory = Some(memory);
        }
    }

    #[test]
    fn prepared_handler_keeps_state_between_calls() {
        let invocable = Invocable::handler(Counter::default());
        let args = ToolArguments::new();

        invocable.invoke(&args, None).expect("first call");
        let second = invocable.invoke(&args, None).expect("second call");
        assert_eq!(second, ToolOutput::Text("2".to_string()));
    }

    #[test]
    fn factory_builds_a_fresh_handler_per_call() {
        static BUILT: AtomicUsize = AtomicUsize::new(0);
        let invocable = Invocable::factory(|| {
            BUILT.fetch_add(1, Ordering::SeqCst);
            Counter::default()
        });
        let args = ToolArguments::new();

        invocable.invoke(&args, None).expect("first call");
        let second = invocable.invoke(&args, None).expect("second call");
        assert_eq!(second, ToolOutput::Text("1".to_string()));
        assert_eq!(BUILT.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn memory_aware_handler_receives_session_memory() {
        let memory = shared(ConversationMemory::new(MemoryLimits::unbounded()));
        lock_memory(&memory)
            .expect("lock")
            .append(Message::user("hello"))
            .expect("append");

        let invocable = Invocable::factory(HistoryLength::default);
        let output = invocable
            .invoke(&ToolArguments::new(), Some(&memory))
            .expect("call should see memory");
        assert_eq!(output, ToolOutput::Text("1".to_string()));
    }
}
