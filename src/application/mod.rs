// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one goal per use case: train, evaluate, or search.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - No clap types: the CLI converts its arguments into the
//     plain config values defined in config.rs
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Run configuration values and their validation
pub mod config;

// One training run: build or resume, train, evaluate
pub mod train_use_case;

// Evaluate a saved checkpoint
pub mod eval_use_case;

// Grid search over lr × keep × l2
pub mod search_use_case;
