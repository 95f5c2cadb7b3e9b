// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from the files on disk all the
// way to tensor batches.
//
// The pipeline flows in this order:
//
//   vocab.dat            → Vocabulary       (size check, id → token)
//   glove.*.safetensors  → EmbeddingMatrix  (frozen vectors)
//   {split}.ids.* files  → SplitLoader      (typed NliExamples)
//       │
//       ▼
//   NliDataset           → implements Burn's Dataset trait
//       │
//       ▼
//   NliBatcher           → pads, embeds and one-hot encodes a batch
//       │
//       ▼
//   DataLoader           → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Typed data-integrity failures
pub mod error;

/// Token list with line-number ids
pub mod vocab;

/// Pretrained embedding table loaded from safetensors
pub mod embeddings;

/// Reads the three parallel files of a split
pub mod loader;

/// Implements Burn's Dataset trait for NLI examples
pub mod dataset;

/// Implements Burn's Batcher trait to create padded tensor batches
pub mod batcher;
