//! Tool catalog, relevance selection, and dispatch.
//!
//! ```rust
//! use ctooling::{
//!     ActiveToolSet, Invocable, ToolCatalog, ToolDescriptor, ToolDispatcher, ToolResultEnvelope,
//!     required_string,
//! };
//!
//! let catalog = ToolCatalog::new().with_tool(ToolDescriptor::new(
//!     "get_weather",
//!     "Current weather for a city",
//!     r#"{"type":"object","properties":{"location":{"type":"string"}}}"#,
//!     Invocable::function(|args| {
//!         let _location = required_string(args, "location")?;
//!         Ok(ToolResultEnvelope::with_content("10C").send_directly().into())
//!     }),
//! ));
//!
//! let active = ActiveToolSet::new(catalog.descriptors().cloned().collect());
//! let envelope = ToolDispatcher::new()
//!     .invoke(&active, "get_weather", r#"{"location":"Tokyo"}"#)
//!     .expect("dispatch should succeed")
//!     .expect("tool returned content");
//!
//! assert_eq!(envelope.content.as_deref(), Some("10C"));
//! assert!(envelope.send_directly_to_user);
//! ```

mod active;
mod args;
mod catalog;
mod dispatcher;
mod envelope;
mod error;
mod hooks;
mod selector;
mod tool;

pub mod prelude {
    pub use crate::{
        ActiveToolSet, Invocable, PatternGroup, SelectorConfig, ToolArguments, ToolCallbacks,
        ToolCatalog, ToolDescriptor, ToolDispatchHooks, ToolDispatcher, ToolEmbedding, ToolError,
        ToolErrorKind, ToolHandler, ToolOutput, ToolResultEnvelope, ToolSelector,
    };
}

pub use active::ActiveToolSet;
pub use args::{ToolArguments, optional_string, parse_arguments, required_string};
pub use catalog::{ToolCatalog, ToolDescriptor};
pub use dispatcher::ToolDispatcher;
pub use envelope::{ToolOutput, ToolResultEnvelope};
pub use error::{ToolError, ToolErrorKind};
pub use hooks::{
    FinishCallback, NoopToolDispatchHooks, StartCallback, ToolCallbacks, ToolDispatchHooks,
};
pub use selector::{
    DEFAULT_K_NEAREST, DEFAULT_MIN_SIMILARITY, DEFAULT_TOOL_TOKEN_BUDGET, PatternGroup,
    PatternGroupSpec, SelectorConfig, ToolEmbedding, ToolSelector,
};
pub use tool::{HandlerFactory, Invocable, ToolFn, ToolHandler};
