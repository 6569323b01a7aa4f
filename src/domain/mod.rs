// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and traits that define the core concepts
// of attention exploration.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or rendering code
//   - Only plain Rust structs, enums, and traits
//
// Keeping this layer pure means the extraction and ranking
// logic is testable with hand-built tensors, no GPU needed.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Tokenised input text with index-disambiguated labels
pub mod token;

// Attention tensors, matrices, and ranked pairs
pub mod attention;

// The exclusion policy and top-pair ranking
pub mod ranking;

// Core abstractions (traits) that the ml layer implements
pub mod traits;
