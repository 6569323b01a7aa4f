// ============================================================
// Layer 7 — Visual Layer
// ============================================================
// Rasterises attention matrices into heatmap images. This is
// deliberately framework-free rendering: an RGB pixel buffer,
// gradient palettes sampled per cell, and a compact bitmap
// font for token labels. PNG encoding happens at the edge,
// when the image leaves the process.
//
// Nothing in here knows about models or tokenizers; the inputs
// are the pure domain types.

/// The five named colour palettes
pub mod palette;

/// The heatmap renderer and PNG export
pub mod heatmap;
