// ============================================================
// Layer 4 — Input Text Pipeline
// ============================================================
// Everything between the raw command-line sentence and the
// tokenizer. Short pipeline here: one normalisation step.
//
//   raw --text argument
//       │
//       ▼
//   Preprocessor   → strips control characters, collapses
//       │            whitespace, trims
//       ▼
//   Tokenizer      → converts words to token ids (Layer 6
//                    owns tokenizer persistence)
//
// Blank-input detection runs on the cleaned text, so an input
// of only whitespace and control characters is rejected before
// any model work happens.

/// Cleans and normalises the raw input sentence
pub mod preprocessor;
