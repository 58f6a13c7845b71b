//! The per-ask subset of the catalog offered to the provider.

use ccommon::Registry;
use cprovider::ToolDefinition;

use crate::ToolDescriptor;

#[derive(Debug, Clone, Default)]
pub struct ActiveToolSet {
    selected: Vec<ToolDescriptor>,
    active: Registry<String, ToolDescriptor>,
}

impl ActiveToolSet {
    pub fn new(selected: Vec<ToolDescriptor>) -> Self {
        let mut set = Self {
            selected,
            active: Registry::new(),
        };
        set.reset();
        set
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Provider-facing schemas in activation order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.active
            .values()
            .map(|descriptor| descriptor.definition().clone())
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.active.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.active.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.active.keys().cloned().collect()
    }

    pub fn token_total(&self) -> usize {
        self.active.values().map(ToolDescriptor::token_cost).sum()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Drops the named tools from what is offered. Unknown names are ignored.
    pub fn remove_tools<I, S>(&mut self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let removed = names
            .into_iter()
            .filter_map(|name| self.active.remove(name.as_ref()).map(|_| name.as_ref().to_string()))
            .collect::<Vec<_>>();

        if !removed.is_empty() {
            tracing::info!(
                removed = ?removed,
                remaining = ?self.names(),
                token_total = self.token_total(),
                "removed tools from active set"
            );
        }
        removed
    }

    /// Restores the set chosen at selection time.
    pub fn reset(&mut self) {
        self.active = Registry::new();
        for descriptor in &self.selected {
            self.active
                .insert(descriptor.name().to_string(), descriptor.clone());
        }
    }
}
