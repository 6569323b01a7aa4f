// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting persistence concerns:
//
//   model_store.rs     — Model presets and checkpoint storage.
//                        Uses Burn's CompactRecorder to load
//                        (or initialise and save) encoder
//                        weights, plus a JSON round-trip of the
//                        architecture so a checkpoint directory
//                        is self-describing.
//
//   tokenizer_store.rs — Tokenizer persistence. Builds a
//                        word-level vocabulary from the input
//                        text if none exists, or loads a
//                        previously saved one, so repeated runs
//                        agree on token ids.
//
//   export.rs          — Output artifacts: the heatmap PNG and
//                        the top-pair scores CSV.
//
// These are used by the application layer but belong to no
// business layer; swapping a store implementation (e.g. cloud
// checkpoints) touches nothing else.
//
// Reference: Burn Book §5 (Checkpointing)

/// Model presets, checkpoint saving and loading
pub mod model_store;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Heatmap PNG and scores CSV writers
pub mod export;
