// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Manages tokenizer building, saving, and loading.
//
// In tokenizers 0.15, train_from_files requires Trainer::Model
// to equal ModelWrapper. The correct approach is to build the
// tokenizer JSON manually and load it back, bypassing the
// trainer type mismatch entirely.
//
// The vocabulary is word-level, built from the input text
// itself: alphanumeric runs and punctuation runs, split the
// same way the Whitespace pre-tokenizer splits, so every piece
// the pre-tokenizer produces has a vocabulary entry. Special
// tokens use the fixed BERT-convention ids the rest of the
// pipeline assumes ([CLS]=101, [SEP]=102).

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokenizers::Tokenizer;

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load the saved tokenizer, or build one from `text`.
    pub fn load_or_build(&self, text: &str, vocab_size: usize) -> Result<Tokenizer> {
        let tok_path = self.dir.join("tokenizer.json");
        if tok_path.exists() {
            tracing::info!("Loading existing tokenizer from disk");
            self.load()
        } else {
            tracing::info!("Building new tokenizer (vocab_size={})", vocab_size);
            self.build_and_save(text, vocab_size)
        }
    }

    /// Load a previously saved tokenizer from its JSON file.
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.dir.join("tokenizer.json");
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))
    }

    /// Build a word-level vocabulary from the input text and write
    /// a valid tokenizer JSON directly.
    fn build_and_save(&self, text: &str, vocab_size: usize) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir).ok();

        // ── Step 1: Special tokens with fixed BERT-convention ids ─────────────
        let mut vocab = serde_json::json!({
            "[PAD]":  0,
            "[UNK]":  1,
            "[CLS]":  101,
            "[SEP]":  102,
            "[MASK]": 103,
        });

        // ── Step 2: Vocabulary entries from the text itself ───────────────────
        // Pieces are lowercased to match the normalizer below
        let mut next_id = 104usize;
        for piece in word_pieces(text) {
            if next_id >= vocab_size {
                tracing::warn!("Vocabulary budget {} exhausted; later words map to [UNK]", vocab_size);
                break;
            }
            if vocab.get(&piece).is_none() {
                vocab[&piece] = serde_json::json!(next_id);
                next_id += 1;
            }
        }

        // ── Step 3: Write tokenizer JSON in the format from_file expects ─────
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": 0,   "content": "[PAD]",  "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 1,   "content": "[UNK]",  "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 101, "content": "[CLS]",  "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 102, "content": "[SEP]",  "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
                {"id": 103, "content": "[MASK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": {
                "type": "Whitespace"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        let tok_path = self.dir.join("tokenizer.json");
        std::fs::write(
            &tok_path,
            serde_json::to_string_pretty(&tokenizer_json)?
        ).with_context(|| "Cannot write tokenizer JSON")?;

        tracing::info!(
            "Tokenizer built with {} entries, saved to '{}'",
            next_id,
            tok_path.display()
        );

        // Load back as a proper Tokenizer instance
        Tokenizer::from_file(&tok_path)
            .map_err(|e| anyhow::anyhow!("Cannot reload tokenizer: {e}"))
    }
}

/// Split text into the pieces the Whitespace pre-tokenizer will
/// produce: runs of word characters, and runs of everything else
/// that is not whitespace. Lowercased, matching the normalizer.
fn word_pieces(text: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    // None = between pieces, Some(true) = in a word run,
    // Some(false) = in a punctuation run
    let mut in_word: Option<bool> = None;

    for c in text.to_lowercase().chars() {
        if c.is_whitespace() {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            in_word = None;
            continue;
        }
        let word_char = c.is_alphanumeric() || c == '_';
        if in_word != Some(word_char) && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
        }
        current.push(c);
        in_word = Some(word_char);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_pieces_splits_words_and_punctuation() {
        assert_eq!(
            word_pieces("Obama was born."),
            vec!["obama", "was", "born", "."]
        );
        // Punctuation runs stay together, like the pre-tokenizer
        assert_eq!(word_pieces("wait... what?!"), vec!["wait", "...", "what", "?!"]);
    }

    #[test]
    fn test_build_assigns_fixed_special_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let tokenizer = store.load_or_build("Obama was born.", 30522).unwrap();

        assert_eq!(tokenizer.token_to_id("[CLS]"), Some(101));
        assert_eq!(tokenizer.token_to_id("[SEP]"), Some(102));
        assert_eq!(tokenizer.token_to_id("[PAD]"), Some(0));
        assert_eq!(tokenizer.token_to_id("[UNK]"), Some(1));
    }

    #[test]
    fn test_encode_covers_every_input_piece() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let tokenizer = store.load_or_build("Obama was born.", 30522).unwrap();

        let encoding = tokenizer.encode("Obama was born.", false).unwrap();
        let tokens: Vec<String> = encoding
            .get_ids()
            .iter()
            .map(|&id| tokenizer.id_to_token(id).unwrap())
            .collect();
        assert_eq!(tokens, vec!["obama", "was", "born", "."]);
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let tokenizer = store.load_or_build("the dog ran", 30522).unwrap();

        let encoding = tokenizer.encode("the zebra ran", false).unwrap();
        let ids = encoding.get_ids();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[1], 1); // [UNK]
    }

    #[test]
    fn test_saved_tokenizer_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let built = store.load_or_build("the dog ran", 30522).unwrap();
        let reloaded = store.load_or_build("completely different words", 30522).unwrap();

        // Second call loads the saved vocabulary instead of
        // rebuilding, so ids agree across runs
        let a = built.encode("the dog", false).unwrap();
        let b = reloaded.encode("the dog", false).unwrap();
        assert_eq!(a.get_ids(), b.get_ids());
    }

    #[test]
    fn test_vocab_budget_is_respected() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        // Budget of 105 leaves room for exactly one content word
        let tokenizer = store.load_or_build("alpha beta gamma", 105).unwrap();
        assert!(tokenizer.token_to_id("alpha").is_some());
        assert!(tokenizer.token_to_id("beta").is_none());
    }
}
