// ============================================================
// Layer 3 — Top-Pair Ranking
// ============================================================
// Turns an attention matrix into the strongest token-to-token
// dependencies, under a fixed exclusion policy:
//
//   1. no self-loops (i == j)
//   2. neither endpoint is a special token ([CLS], [SEP],
//      [PAD], <|endoftext|>)
//   3. neither endpoint is a single ASCII punctuation character
//
// Ordering is score descending; ties break on ascending (i, j),
// so equal scores always come out in candidate-generation order.

use anyhow::{bail, Result};

use crate::domain::attention::{AttentionMatrix, AttentionPair};
use crate::domain::token::TokenSequence;

/// Special tokens never reported as pair endpoints. A fixed literal
/// set, not derived from the tokenizer.
pub const EXCLUDED_TOKENS: [&str; 4] = ["[CLS]", "[SEP]", "[PAD]", "<|endoftext|>"];

/// True for tokens that are exactly one ASCII punctuation character.
fn is_punctuation(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(c), None) if c.is_ascii_punctuation()
    )
}

fn is_eligible(token: &str) -> bool {
    !EXCLUDED_TOKENS.contains(&token) && !is_punctuation(token)
}

/// Rank all eligible (source, target) pairs by attention score and
/// return the first `top_n`.
///
/// Returns fewer than `top_n` pairs when fewer are eligible, and an
/// empty Vec when none are. The empty result is a normal outcome
/// (the caller shows a "no pairs found" state), distinct from the
/// dimension-mismatch error below.
pub fn top_pairs(
    tokens: &TokenSequence,
    matrix: &AttentionMatrix,
    top_n: usize,
) -> Result<Vec<AttentionPair>> {
    if tokens.len() != matrix.len() {
        bail!(
            "token count {} does not match attention matrix dimension {}",
            tokens.len(),
            matrix.len(),
        );
    }

    let eligible: Vec<bool> = tokens.iter().map(is_eligible).collect();

    let mut pairs = Vec::new();
    for i in 0..tokens.len() {
        if !eligible[i] {
            continue;
        }
        for j in 0..tokens.len() {
            if i == j || !eligible[j] {
                continue;
            }
            pairs.push(AttentionPair {
                source: tokens.label(i),
                target: tokens.label(j),
                source_index: i,
                target_index: j,
                score: matrix.get(i, j),
            });
        }
    }

    // Score descending; ascending (i, j) as the documented tie-break.
    pairs.sort_by(|a, b| {
        b.score.total_cmp(&a.score).then_with(|| {
            (a.source_index, a.target_index).cmp(&(b.source_index, b.target_index))
        })
    });
    pairs.truncate(top_n);

    Ok(pairs)
}
