// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one goal: turning an input sentence into attention artifacts.
//
// Rules for this layer:
//   - No tensor math or model code here
//   - No printing here (that's Layer 1)
//   - No direct pixel or file format work (Layers 6 and 7)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

// The visualization workflow
pub mod visualize_use_case;
