// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that persists state between runs:
//
//   checkpoint.rs     — model weights + latest.json pointer +
//                       the config needed to rebuild the model
//
//   metrics.rs        — run_config.json and the per-epoch
//                       metrics.csv in the log directory
//
//   results_store.rs  — grid-search results table, rewritten
//                       atomically after every trial
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving, retention and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Persistent grid-search results
pub mod results_store;
