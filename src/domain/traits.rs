// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// By programming against traits instead of concrete types,
// the extraction pipeline never needs to know which model
// implementation produced the attention weights. The ml layer
// implements AttentionSource with a Burn encoder; tests
// implement it with hand-built tensors.
//
// The trait is also the ownership boundary: the host acquires
// and caches the model resource, then lends it to extraction
// as a read-only handle. No hidden global model cache exists.

use anyhow::Result;

use crate::domain::attention::AttentionTensor;

// ─── AttentionSource ──────────────────────────────────────────────────────────
/// A model resource that can produce per-layer self-attention
/// maps for a tokenised input.
///
/// Implementations:
///   - ModelSession → runs a Burn transformer encoder
///   - test stubs   → return fixed synthetic tensors
pub trait AttentionSource {
    /// Number of stacked attention layers in the model.
    /// Valid layer indices are 0..layer_count().
    fn layer_count(&self) -> usize;

    /// Run one forward pass and return every layer's attention,
    /// element k being layer k's tensor. The pass must not track
    /// gradients; the input must not be silently truncated.
    fn attention_maps(&self, input_ids: &[u32]) -> Result<Vec<AttentionTensor>>;
}
