// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that builds, runs or updates the network.
//
//   encoder.rs    — statement encoders (LSTM, BiLSTM, bag of words)
//                   that read only the valid steps of padded input
//
//   classifier.rs — merge projections + feed-forward stack + output
//                   layer, and the L2 penalty over its weights
//
//   model.rs      — NliModel: two encoders + classifier, the loss
//
//   clip.rs       — global-norm gradient clipping
//
//   trainer.rs    — the training loop with periodic checkpoints
//
//   evaluator.rs  — accuracy, loss and confusion matrix on a split
//
// Backends:
//   Training runs on Autodiff<ComputeBackend>; evaluation runs on
//   ComputeBackend itself via `model.valid()`. ComputeBackend is
//   the CPU NdArray backend unless built with `--features wgpu`.
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Sentence encoders over padded batches
pub mod encoder;

/// Pair classifier on top of the two statement vectors
pub mod classifier;

/// Full NLI model and its loss
pub mod model;

/// Gradient clipping by global norm
pub mod clip;

/// Training loop
pub mod trainer;

/// Evaluation on a held-out split
pub mod evaluator;

#[cfg(not(feature = "wgpu"))]
pub type ComputeBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
pub type ComputeBackend = burn::backend::Wgpu;

pub type TrainBackend = burn::backend::Autodiff<ComputeBackend>;
