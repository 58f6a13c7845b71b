//! Tool descriptors and the configured catalog.
//!
//! ```rust
//! use ctooling::{Invocable, ToolCatalog, ToolDescriptor, ToolOutput};
//!
//! let mut catalog = ToolCatalog::new();
//! catalog.add(ToolDescriptor::new(
//!     "ping",
//!     "Replies with pong",
//!     r#"{"type":"object","properties":{}}"#,
//!     Invocable::function(|_| Ok(ToolOutput::from("pong"))),
//! ));
//!
//! assert!(catalog.contains("ping"));
//! assert!(catalog.get("ping").expect("ping").token_cost() > 0);
//! ```

use ccommon::Registry;
use cmemory::{HeuristicTokenCounter, TokenCounter};
use cprovider::ToolDefinition;

use crate::Invocable;

#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    definition: ToolDefinition,
    invocable: Invocable,
    token_cost: usize,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: impl Into<String>,
        invocable: Invocable,
    ) -> Self {
        Self::from_definition(
            ToolDefinition::new(name, description, input_schema),
            invocable,
        )
    }

    pub fn from_definition(definition: ToolDefinition, invocable: Invocable) -> Self {
        Self::measured(definition, invocable, &HeuristicTokenCounter)
    }

    /// Costs the tool as the serialized function schema sent to the provider.
    pub fn measured(
        definition: ToolDefinition,
        invocable: Invocable,
        counter: &dyn TokenCounter,
    ) -> Self {
        let token_cost = match definition.to_function_json() {
            Ok(rendered) => counter.count_json(&rendered),
            Err(_) => counter.count_text(&format!(
                "{} {} {}",
                definition.name, definition.description, definition.input_schema
            )),
        };

        Self {
            definition,
            invocable,
            token_cost,
        }
    }

    pub fn with_token_cost(mut self, token_cost: usize) -> Self {
        self.token_cost = token_cost;
        self
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    pub fn invocable(&self) -> &Invocable {
        &self.invocable
    }

    pub fn token_cost(&self) -> usize {
        self.token_cost
    }
}

/// Every tool the session may offer, keyed by unique name in registration order.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Registry<String, ToolDescriptor>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a tool; a replaced tool keeps its position.
    pub fn add(&mut self, descriptor: ToolDescriptor) -> Option<ToolDescriptor> {
        self.tools.insert(descriptor.name().to_string(), descriptor)
    }

    pub fn with_tool(mut self, descriptor: ToolDescriptor) -> Self {
        self.add(descriptor);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<ToolDescriptor> {
        self.tools.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|descriptor| descriptor.definition.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl FromIterator<ToolDescriptor> for ToolCatalog {
    fn from_iter<T: IntoIterator<Item = ToolDescriptor>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for descriptor in iter {
            catalog.add(descriptor);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use cmemory::WordTokenCounter;

    use super::*;
    use crate::ToolOutput;

    fn noop() -> Invocable {
        Invocable::function(|_| Ok(ToolOutput::Nothing))
    }

    #[test]
    fn catalog_keeps_registration_order_across_replacement() {
        let mut catalog: ToolCatalog = ["a", "b", "c"]
            .into_iter()
            .map(|name| ToolDescriptor::new(name, "", "{}", noop()))
            .collect();

        catalog.add(ToolDescriptor::new("a", "replaced", "{}", noop()));
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(catalog.get("a").expect("a").definition().description, "replaced");

        catalog.remove("b");
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn measured_cost_uses_the_supplied_counter() {
        let descriptor = ToolDescriptor::measured(
            ToolDefinition::new("lookup", "Look something up", "{}"),
            noop(),
            &WordTokenCounter,
        );
        assert_eq!(descriptor.token_cost(), 3);
        assert_eq!(descriptor.with_token_cost(42).token_cost(), 42);
    }

    #[test]
    fn invalid_schema_still_gets_a_cost() {
        let descriptor = ToolDescriptor::new("broken", "desc", "{", noop());
        assert!(descriptor.token_cost() > 0);
    }
}
