// ============================================================
// Layer 2 — EvalUseCase
// ============================================================
// Scores a trained checkpoint on the dev or test split:
//
//   Step 1: Read train_config.json from the checkpoint directory
//   Step 2: Load embeddings and the requested split
//   Step 3: Rebuild the model and restore the newest weights
//   Step 4: Evaluate on the inner backend (no dropout)
//
// Unlike training, a missing checkpoint is an error here.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{bail, Result};
use burn::prelude::*;

use crate::application::{
    config::{DataLimits, RunPaths},
    train_use_case::Corpus,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    evaluator::{evaluate, EvalReport},
    ComputeBackend,
};

pub struct EvalUseCase {
    paths:      RunPaths,
    limits:     DataLimits,
    /// Overrides the batch size stored with the checkpoint
    batch_size: Option<usize>,
}

impl EvalUseCase {
    pub fn new(paths: RunPaths, limits: DataLimits, batch_size: Option<usize>) -> Self {
        Self { paths, limits, batch_size }
    }

    pub fn execute(&self) -> Result<EvalReport> {
        let checkpoints = CheckpointManager::new(self.paths.resume_dir(), 0);
        let cfg = checkpoints.load_config()?;

        let corpus = Corpus::open(&self.paths, cfg.model.embedding_size)?;
        let split  = self.limits.eval_split;
        let eval   = corpus.split(split.as_str(), self.limits.num_eval)?;

        let device = <ComputeBackend as Backend>::Device::default();
        let model  = cfg.model.init::<ComputeBackend>(&device);
        let Some((model, iteration)) = checkpoints.load_latest(model, &device)? else {
            bail!("No checkpoint found in '{}'. Run 'train' first.", checkpoints.dir().display());
        };

        let report = evaluate(
            &model,
            eval,
            corpus.embeddings.clone(),
            self.batch_size.unwrap_or(cfg.batch_size),
            &device,
        );
        tracing::info!(
            "Evaluated iteration {} on '{}': accuracy {:.2}%, loss {:.4}",
            iteration,
            split,
            report.accuracy * 100.0,
            report.loss,
        );
        Ok(report)
    }
}
