//! Token counting used for memory budgets.
//!
//! ```rust
//! use cmemory::{HeuristicTokenCounter, TokenCounter, WordTokenCounter};
//!
//! assert_eq!(HeuristicTokenCounter.count_text("hello world!"), 3);
//! assert_eq!(WordTokenCounter.count_text("hello  world"), 2);
//! assert_eq!(WordTokenCounter.count_text("   "), 0);
//! ```

pub trait TokenCounter: Send + Sync {
    fn count_text(&self, text: &str) -> usize;

    fn count_json(&self, value: &serde_json::Value) -> usize {
        self.count_text(&value.to_string())
    }
}

/// Approximates BPE tokenizers at four characters per token.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicTokenCounter;

impl HeuristicTokenCounter {
    const CHARS_PER_TOKEN: usize = 4;
}

impl TokenCounter for HeuristicTokenCounter {
    fn count_text(&self, text: &str) -> usize {
        let chars = text.chars().count();
        if chars == 0 {
            return 0;
        }
        chars.div_ceil(Self::CHARS_PER_TOKEN)
    }
}

/// One token per whitespace-separated word.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordTokenCounter;

impl TokenCounter for WordTokenCounter {
    fn count_text(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn heuristic_counter_rounds_up_partial_tokens() {
        assert_eq!(HeuristicTokenCounter.count_text("a"), 1);
        assert_eq!(HeuristicTokenCounter.count_text("abcd"), 1);
        assert_eq!(HeuristicTokenCounter.count_text("abcde"), 2);
        assert_eq!(HeuristicTokenCounter.count_text(""), 0);
    }

    #[test]
    fn json_counting_uses_compact_rendering() {
        let value = json!({"a": 1});
        assert_eq!(WordTokenCounter.count_json(&value), 1);
        assert_eq!(HeuristicTokenCounter.count_json(&value), 2);
    }
}
