// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that define what the system talks about:
// labels, labelled examples, and the confusion matrix that
// summarises predictions.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// The three NLI relations and their one-hot encoding
pub mod label;

// A premise / hypothesis / gold label triple
pub mod example;

// Gold × predicted count table
pub mod confusion;

// Core abstractions (traits) that other layers implement
pub mod traits;
