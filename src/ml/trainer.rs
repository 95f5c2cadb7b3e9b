// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Minibatch training with Burn's DataLoader and Adam or SGD.
//
// Per batch:
//   1. forward          scores = model(premises, hypotheses)
//   2. loss             mean CE(softmax(scores), one-hot) + λ·Σ½‖W‖²
//   3. backward         gradients for every parameter
//   4. clip             rescale ALL gradients so the global norm ≤ max
//   5. step             optimizer update at the configured lr
//
// A non-finite loss or gradient norm stops the run before step 5,
// so a diverged model is never written to disk.
//
// Iterations are counted globally: a resumed run continues the
// numbering of the checkpoint it was restored from, and `epochs`
// is the number of additional epochs to run.
//
// Reference: Burn Book §5 (Custom Training Loop)
//            Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    optim::{AdamConfig, GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::sync::Arc;
use thiserror::Error;

use crate::application::config::{OptimizerKind, TrainConfig};
use crate::data::{batcher::NliBatcher, dataset::NliDataset, embeddings::EmbeddingMatrix};
use crate::domain::confusion::ConfusionMatrix;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    clip::clip_global_norm,
    model::{predictions, NliModel},
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainError {
    #[error("{what} became {value} at iteration {iteration}; training stopped")]
    NonFinite {
        what:      &'static str,
        value:     f64,
        iteration: usize,
    },
}

/// What a finished run reports. Loss and accuracy are measured over
/// the training batches of the final epoch; both are 0 when no epoch ran.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainSummary {
    pub epochs_run:     usize,
    /// Global iteration count at the end of the run
    pub iterations:     usize,
    pub train_accuracy: f64,
    /// Mean cross-entropy per example (L2 term excluded)
    pub train_loss:     f64,
}

/// Everything one training run needs besides the model itself.
pub struct TrainingRun<'a, B: AutodiffBackend> {
    pub cfg:         &'a TrainConfig,
    pub dataset:     Arc<NliDataset>,
    pub embeddings:  Arc<EmbeddingMatrix>,
    pub checkpoints: &'a CheckpointManager,
    pub metrics:     Option<&'a MetricsLogger>,
    pub device:      B::Device,
}

impl<B: AutodiffBackend> TrainingRun<'_, B> {
    /// Train `model` starting from global iteration `start_iteration`.
    pub fn run(&self, model: NliModel<B>, start_iteration: usize) -> Result<(NliModel<B>, TrainSummary)> {
        match self.cfg.optimizer {
            // m = β1*m + (1-β1)*g ; v = β2*v + (1-β2)*g² ; θ -= lr * m / (√v + ε)
            OptimizerKind::Adam => self.run_with(model, start_iteration, AdamConfig::new().with_epsilon(1e-8).init()),
            // θ -= lr * g
            OptimizerKind::Sgd => self.run_with(model, start_iteration, SgdConfig::new().init()),
        }
    }

    fn run_with<O>(&self, mut model: NliModel<B>, start_iteration: usize, mut optim: O) -> Result<(NliModel<B>, TrainSummary)>
    where
        O: Optimizer<NliModel<B>, B>,
    {
        let cfg = self.cfg;

        // ── Training data loader (reshuffled every epoch from the seed) ──────
        let batcher = NliBatcher::<B>::new(self.embeddings.clone(), self.device.clone());
        let loader  = DataLoaderBuilder::new(batcher)
            .batch_size(cfg.batch_size)
            .shuffle(cfg.seed)
            .build(self.dataset.clone());

        let mut iteration = start_iteration;
        let mut summary   = TrainSummary { iterations: iteration, ..Default::default() };

        tracing::info!(
            "Training {} examples for {} epochs (batch {}, lr {:e}, keep {}, l2 {:e}, {})",
            self.dataset.examples().len(),
            cfg.epochs,
            cfg.batch_size,
            cfg.lr,
            cfg.dropout_keep(),
            cfg.l2,
            cfg.optimizer,
        );

        // ── Epoch loop ────────────────────────────────────────────────────────
        for epoch in 1..=cfg.epochs {
            let mut loss_sum  = 0.0f64;
            let mut confusion = ConfusionMatrix::new();

            for batch in loader.iter() {
                iteration += 1;
                let n = batch.len();

                let output = model.forward_loss(&batch, cfg.l2);

                let loss_val: f64 = output.loss.clone().into_scalar().elem::<f64>();
                if !loss_val.is_finite() {
                    return Err(TrainError::NonFinite { what: "loss", value: loss_val, iteration }.into());
                }
                loss_sum += output.data_loss.into_scalar().elem::<f64>() * n as f64;
                for (gold, predicted) in batch.gold.iter().zip(predictions(output.scores)) {
                    confusion.record(*gold, predicted);
                }

                // Backward pass, global clip, update
                let grads = output.loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                let (grads, grad_norm) = clip_global_norm::<B, _>(&model, grads, cfg.max_grad_norm);
                if !grad_norm.is_finite() {
                    return Err(TrainError::NonFinite { what: "gradient norm", value: grad_norm, iteration }.into());
                }
                model = optim.step(cfg.lr, model, grads);

                if cfg.print_every > 0 && iteration % cfg.print_every == 0 {
                    tracing::info!(
                        "iter {:>6} | epoch {:>3} | loss {:.4} | grad norm {:.4}",
                        iteration,
                        epoch,
                        loss_val,
                        grad_norm,
                    );
                }

                if cfg.checkpoint_every > 0 && iteration % cfg.checkpoint_every == 0 {
                    self.save(&model, iteration)?;
                }
            }

            let seen = confusion.total();
            summary = TrainSummary {
                epochs_run:     epoch,
                iterations:     iteration,
                train_accuracy: confusion.accuracy(),
                train_loss:     if seen > 0 { loss_sum / seen as f64 } else { 0.0 },
            };

            tracing::info!(
                "Epoch {:>3}/{} | train_loss {:.4} | train_acc {:.2}%",
                epoch,
                cfg.epochs,
                summary.train_loss,
                summary.train_accuracy * 100.0,
            );

            if let Some(metrics) = self.metrics {
                metrics.log(&EpochMetrics {
                    epoch,
                    iteration,
                    train_loss: summary.train_loss,
                    train_acc:  summary.train_accuracy,
                })?;
            }
        }

        // Final checkpoint is written even when no epoch ran.
        self.save(&model, iteration)?;
        Ok((model, summary))
    }

    fn save(&self, model: &NliModel<B>, iteration: usize) -> Result<()> {
        self.checkpoints.save_model(model, iteration)?;
        if tracing::enabled!(tracing::Level::DEBUG) {
            for w in model.classifier.weight_summaries() {
                tracing::debug!(
                    "{:<16} mean {:+.4} std {:.4} min {:+.4} max {:+.4}",
                    w.name, w.mean, w.std, w.min, w.max
                );
            }
        }
        Ok(())
    }
}
