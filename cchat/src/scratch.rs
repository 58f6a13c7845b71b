//! Per-ask working state: scratch thoughts and streamed tool-call assembly.

use std::collections::BTreeMap;

use cprovider::{Message, ToolCall, ToolCallFragment};

/// Ephemeral transcript of the tool rounds of one ask.
///
/// Sent to the provider after committed memory, never committed itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScratchThoughts {
    entries: Vec<Message>,
}

impl ScratchThoughts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.entries.push(message);
    }

    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PendingToolCall {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// Assembles tool calls from indexed stream fragments.
///
/// Slots are keyed by the fragment's call index, which the provider controls
/// and may leave sparse; a round's calls are only read back through
/// [`ToolCallAccumulator::finish`].
#[derive(Debug, Clone, Default)]
pub struct ToolCallAccumulator {
    slots: BTreeMap<usize, PendingToolCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, fragment: ToolCallFragment) {
        let slot = self.slots.entry(fragment.index).or_default();
        if let Some(id) = fragment.id.filter(|id| !id.is_empty()) {
            slot.id = Some(id);
        }
        if let Some(name) = fragment.name.filter(|name| !name.is_empty()) {
            slot.name = Some(name);
        }
        if let Some(arguments) = fragment.arguments {
            slot.arguments.push_str(&arguments);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Completed calls in index order. Slots that never received a name are dropped.
    pub fn finish(self) -> Vec<ToolCall> {
        self.slots
            .into_iter()
            .filter_map(|(index, slot)| {
                let Some(name) = slot.name else {
                    tracing::warn!(index, "dropping streamed tool call without a name");
                    return None;
                };
                let id = slot.id.unwrap_or_else(|| format!("call_{index}"));
                Some(ToolCall::new(id, name, slot.arguments))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_and_extreme_indices_keep_index_order() {
        let mut accumulator = ToolCallAccumulator::new();
        accumulator.apply(ToolCallFragment::start(usize::MAX, "call_z", "get_time"));
        accumulator.apply(ToolCallFragment::start(1_000_000_000, "call_y", "get_weather"));
        accumulator.apply(ToolCallFragment::arguments(usize::MAX, "{}"));
        accumulator.apply(ToolCallFragment::arguments(1_000_000_000, "{}"));

        assert_eq!(
            accumulator.finish(),
            vec![
                ToolCall::new("call_y", "get_weather", "{}"),
                ToolCall::new("call_z", "get_time", "{}"),
            ]
        );
    }

    #[test]
    fn fragments_are_reassembled_by_index() {
        let mut accumulator = ToolCallAccumulator::new();
        accumulator.apply(ToolCallFragment::start(0, "call_a", "get_weather"));
        accumulator.apply(ToolCallFragment::start(1, "call_b", "get_time"));
        accumulator.apply(ToolCallFragment::arguments(0, "{\"location\":"));
        accumulator.apply(ToolCallFragment::arguments(1, "{}"));
        accumulator.apply(ToolCallFragment::arguments(0, "\"Tokyo\"}"));

        let calls = accumulator.finish();
        assert_eq!(
            calls,
            vec![
                ToolCall::new("call_a", "get_weather", "{\"location\":\"Tokyo\"}"),
                ToolCall::new("call_b", "get_time", "{}"),
            ]
        );
    }

    #[test]
    fn nameless_slots_are_dropped_and_missing_ids_are_filled() {
        let mut accumulator = ToolCallAccumulator::new();
        accumulator.apply(ToolCallFragment::arguments(0, "{}"));
        accumulator.apply(ToolCallFragment {
            index: 1,
            name: Some("lookup".to_string()),
            ..ToolCallFragment::default()
        });

        let calls = accumulator.finish();
        assert_eq!(calls, vec![ToolCall::new("call_1", "lookup", "")]);
    }

    #[test]
    fn scratch_thoughts_track_entries() {
        let mut scratch = ScratchThoughts::new();
        scratch.push(Message::assistant_tool_calls(vec![ToolCall::new(
            "call_1", "lookup", "{}",
        )]));
        scratch.push(Message::tool_result("call_1", "lookup", "42"));

        assert_eq!(scratch.len(), 2);
        assert_eq!(scratch.entries()[1].text(), "42");

        scratch.clear();
        assert!(scratch.is_empty());
    }
}
