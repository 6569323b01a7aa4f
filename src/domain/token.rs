// ============================================================
// Layer 3 — Token Domain Type
// ============================================================
// The tokenised form of one input sentence, including the
// special tokens the tokenizer frames it with. Immutable once
// produced; its length fixes both dimensions of the attention
// matrix derived from the same forward pass.

use serde::{Deserialize, Serialize};

/// An ordered sequence of token strings for one input text.
///
/// Indices into this sequence are the coordinate system of every
/// attention matrix and pair derived from the same extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSequence {
    tokens: Vec<String>,
}

impl TokenSequence {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// Number of tokens, N. Matches the attention matrix dimension.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// Token text with its position appended ("dog_3").
    ///
    /// Repeated tokens are common in natural text; the position
    /// suffix keeps pair output unambiguous. `index` must be a
    /// valid index into this sequence.
    pub fn label(&self, index: usize) -> String {
        format!("{}_{}", self.tokens[index], index)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn seq(tokens: &[&str]) -> TokenSequence {
        TokenSequence::new(tokens.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn test_label_appends_index() {
        let tokens = seq(&["[CLS]", "the", "dog", "[SEP]"]);
        assert_eq!(tokens.label(2), "dog_2");
    }

    #[test]
    fn test_label_disambiguates_repeats() {
        let tokens = seq(&["the", "dog", "saw", "the", "cat"]);
        // Two "the" tokens get distinct labels
        assert_eq!(tokens.label(0), "the_0");
        assert_eq!(tokens.label(3), "the_3");
    }

    #[test]
    fn test_len_and_get() {
        let tokens = seq(&["a", "b"]);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens.get(1), Some("b"));
        assert_eq!(tokens.get(2), None);
        assert!(!tokens.is_empty());
    }
}
