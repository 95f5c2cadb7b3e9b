// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Forward passes only: no dropout, no gradients, no updates.
// Meant to be called with `model.valid()`, i.e. on the inner
// (non-autodiff) backend where Dropout is the identity.
//
// Batches are built by the same NliBatcher as in training, in
// file order.
//
// Reference: Burn Book §5 (Validation)

use burn::{data::dataloader::DataLoaderBuilder, prelude::*};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data::{batcher::NliBatcher, dataset::NliDataset, embeddings::EmbeddingMatrix};
use crate::domain::confusion::ConfusionMatrix;
use crate::ml::model::{cross_entropy, predictions, NliModel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    /// trace / total of the confusion matrix; 0 for an empty split
    pub accuracy:  f64,
    /// Mean cross-entropy per example; 0 for an empty split
    pub loss:      f64,
    /// rows = gold, columns = predicted
    pub confusion: ConfusionMatrix,
}

pub fn evaluate<B: Backend>(
    model:      &NliModel<B>,
    dataset:    Arc<NliDataset>,
    embeddings: Arc<EmbeddingMatrix>,
    batch_size: usize,
    device:     &B::Device,
) -> EvalReport {
    let loader = DataLoaderBuilder::new(NliBatcher::<B>::new(embeddings, device.clone()))
        .batch_size(batch_size.max(1))
        .build(dataset);

    let mut confusion = ConfusionMatrix::new();
    let mut loss_sum  = 0.0f64;

    for batch in loader.iter() {
        let scores = model.forward_batch(&batch);
        let loss   = cross_entropy(scores.clone(), batch.labels.clone()).into_scalar().elem::<f64>();
        loss_sum  += loss * batch.len() as f64;

        for (gold, predicted) in batch.gold.iter().zip(predictions(scores)) {
            confusion.record(*gold, predicted);
        }
    }

    let total = confusion.total();
    EvalReport {
        accuracy: confusion.accuracy(),
        loss:     if total > 0 { loss_sum / total as f64 } else { 0.0 },
        confusion,
    }
}
