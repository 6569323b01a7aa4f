// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// No other layer imports from burn directly, with one
// exception: Layer 6 loads checkpoints for the model type
// defined here.
//
// What's in this layer:
//
//   model.rs     — The transformer encoder architecture:
//                  • Token embeddings
//                  • Learned positional embeddings
//                  • Multi-head self-attention
//                  • Feed-forward networks (GELU activation)
//                  • Layer normalisation and residuals
//                  The forward pass collects each layer's
//                  attention weight tensor on the way through.
//
//   extractor.rs — The extraction engine:
//                  frames the input as [CLS] ... [SEP], runs
//                  one inference pass, selects a layer, and
//                  reduces the head dimension (mean or head 0).
//                  Also the AttentionSource implementation
//                  that bridges Burn tensors into the pure
//                  domain types.
//
// Inference runs on a plain backend, never an autodiff
// wrapper, so forward passes carry no gradient state.
//
// Reference: Burn Book §3 (Building Blocks)
//            Vaswani et al. (2017) Attention Is All You Need

/// Transformer encoder architecture with attention taps
pub mod model;

/// Extraction engine and model session
pub mod extractor;
