// ============================================================
// Layer 4 — NLI Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<NliExample>
// into tensors the encoders can consume.
//
// How batching works here:
//   Input:  N examples, each side with its own length
//   Output: NliBatch with
//             premises   [N, P, E]   P = longest premise in the batch
//             hypotheses [N, H, E]   H = longest hypothesis in the batch
//             labels     [N, 3]      one-hot gold labels
//           plus the true (pre-padding) length of every sequence.
//
// Sequences are right-padded. Padded positions hold all-zero
// vectors rather than the embedding row of the padding id, so a
// masked mean or a recurrent run over them starts from nothing.
//
// The embedding table is frozen: rows are copied into the batch
// tensor here instead of living in the model as parameters.
//
// Reference: Burn Book §4 (Batcher)

use std::sync::Arc;

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::embeddings::EmbeddingMatrix;
use crate::domain::{example::NliExample, label::Label};

// ─── NliBatch ─────────────────────────────────────────────────────────────────
/// A batch of premise/hypothesis pairs ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct NliBatch<B: Backend> {
    /// Embedded premises — shape: [batch_size, max_premise_len, embedding_dim]
    pub premises: Tensor<B, 3>,

    /// True premise lengths, all ≥ 1 and ≤ max_premise_len
    pub premise_lengths: Vec<usize>,

    /// Embedded hypotheses — shape: [batch_size, max_hypothesis_len, embedding_dim]
    pub hypotheses: Tensor<B, 3>,

    /// True hypothesis lengths
    pub hypothesis_lengths: Vec<usize>,

    /// One-hot gold labels — shape: [batch_size, 3]
    pub labels: Tensor<B, 2>,

    /// Gold labels as values, for accuracy and the confusion matrix
    pub gold: Vec<Label>,
}

impl<B: Backend> NliBatch<B> {
    pub fn len(&self) -> usize {
        self.gold.len()
    }
}

// ─── NliBatcher ───────────────────────────────────────────────────────────────
/// Holds the shared embedding table and the target device.
#[derive(Clone, Debug)]
pub struct NliBatcher<B: Backend> {
    embeddings: Arc<EmbeddingMatrix>,
    device:     B::Device,
}

impl<B: Backend> NliBatcher<B> {
    pub fn new(embeddings: Arc<EmbeddingMatrix>, device: B::Device) -> Self {
        Self { embeddings, device }
    }

    /// Stack id sequences into a zero-padded [N, max_len, E] tensor.
    fn embed(&self, sequences: &[&[u32]]) -> (Tensor<B, 3>, Vec<usize>) {
        let dim     = self.embeddings.dim();
        let lengths: Vec<usize> = sequences.iter().map(|s| s.len()).collect();
        let max_len = lengths.iter().copied().max().unwrap_or(0).max(1);

        let mut flat = vec![0.0f32; sequences.len() * max_len * dim];
        for (i, seq) in sequences.iter().enumerate() {
            for (t, &id) in seq.iter().enumerate() {
                // Ids are checked against the table when the split is loaded.
                if let Some(row) = self.embeddings.row(id) {
                    let start = (i * max_len + t) * dim;
                    flat[start..start + dim].copy_from_slice(row);
                }
            }
        }

        let data = TensorData::new(flat, [sequences.len(), max_len, dim]);
        (Tensor::from_data(data, &self.device), lengths)
    }
}

impl<B: Backend> Batcher<NliExample, NliBatch<B>> for NliBatcher<B> {
    fn batch(&self, items: Vec<NliExample>) -> NliBatch<B> {
        let premise_ids: Vec<&[u32]>    = items.iter().map(|ex| ex.premise.as_slice()).collect();
        let hypothesis_ids: Vec<&[u32]> = items.iter().map(|ex| ex.hypothesis.as_slice()).collect();

        let (premises, premise_lengths)       = self.embed(&premise_ids);
        let (hypotheses, hypothesis_lengths) = self.embed(&hypothesis_ids);

        let gold: Vec<Label> = items.iter().map(|ex| ex.label).collect();
        let one_hot: Vec<f32> = gold.iter().flat_map(|l| l.one_hot()).collect();
        let labels = Tensor::from_data(TensorData::new(one_hot, [items.len(), Label::COUNT]), &self.device);

        NliBatch {
            premises,
            premise_lengths,
            hypotheses,
            hypothesis_lengths,
            labels,
            gold,
        }
    }
}
