// ============================================================
// Layer 5 — NLI Model
// ============================================================
// Two statement encoders (one per side, no shared weights)
// feeding the pair classifier:
//
//   premises   [B, P, E] ──► premise encoder    ──► [B, Dp] ┐
//                                                           ├─► classifier ─► scores [B, 3]
//   hypotheses [B, H, E] ──► hypothesis encoder ──► [B, Dh] ┘
//
// Training objective:
//   loss = mean_i CE(softmax(scores_i), onehot_i) + λ · Σ ½‖W‖²
//
// The L2 term covers classifier weight matrices only.
//
// Reference: Bowman et al. (2015) SNLI baseline
//            Burn Book §3 (Modules and Config)

use burn::{
    module::{ModuleVisitor, ParamId},
    prelude::*,
    tensor::activation::log_softmax,
};

use crate::data::batcher::NliBatch;
use crate::domain::label::Label;
use crate::ml::classifier::{PairClassifier, PairClassifierConfig};
use crate::ml::encoder::{EncoderKind, SentenceEncoder, StatementEncoder, StatementEncoderConfig};

/// Architecture hyperparameters. Saved next to checkpoints so a
/// model can be rebuilt before its weights are loaded.
#[derive(Config, Debug)]
pub struct NliModelConfig {
    /// Width of the pretrained embedding vectors
    pub embedding_size: usize,
    #[config(default = "EncoderKind::Lstm")]
    pub encoder:        EncoderKind,
    /// LSTM state width per direction
    #[config(default = 100)]
    pub encoder_hidden: usize,
    /// Width of each side after its projection
    #[config(default = 100)]
    pub merge_hidden:   usize,
    #[config(default = 100)]
    pub ff_hidden:      usize,
    #[config(default = 2)]
    pub ff_layers:      usize,
    #[config(default = 3)]
    pub num_classes:    usize,
    #[config(default = 0.8)]
    pub dropout_keep:   f64,
}

impl NliModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> NliModel<B> {
        let encoder_cfg = StatementEncoderConfig::new(self.encoder, self.embedding_size, self.encoder_hidden);
        let premise     = encoder_cfg.init(device);
        let hypothesis  = encoder_cfg.init(device);

        let classifier = PairClassifierConfig::new(
            premise.output_size(),
            hypothesis.output_size(),
            self.merge_hidden,
            self.ff_hidden,
        )
        .with_ff_layers(self.ff_layers)
        .with_num_classes(self.num_classes)
        .with_dropout_keep(self.dropout_keep)
        .init(device);

        materialize(NliModel { premise, hypothesis, classifier })
    }
}

/// Touches every parameter once so lazily initialized weights are drawn
/// now, in field order, instead of in whatever order they are first used.
struct Materialize;

impl<B: Backend> ModuleVisitor<B> for Materialize {
    fn visit_float<const D: usize>(&mut self, _id: ParamId, _tensor: &Tensor<B, D>) {}
}

fn materialize<B: Backend>(model: NliModel<B>) -> NliModel<B> {
    model.visit(&mut Materialize);
    model
}

#[derive(Module, Debug)]
pub struct NliModel<B: Backend> {
    pub premise:    StatementEncoder<B>,
    pub hypothesis: StatementEncoder<B>,
    pub classifier: PairClassifier<B>,
}

/// Result of one training forward pass.
pub struct NliOutput<B: Backend> {
    /// Data loss + λ·L2, the quantity that is differentiated
    pub loss:      Tensor<B, 1>,
    /// Mean cross-entropy alone
    pub data_loss: Tensor<B, 1>,
    /// Raw class scores — shape [batch, num_classes]
    pub scores:    Tensor<B, 2>,
}

impl<B: Backend> NliModel<B> {
    pub fn forward(
        &self,
        premises:           Tensor<B, 3>,
        premise_lengths:    &[usize],
        hypotheses:         Tensor<B, 3>,
        hypothesis_lengths: &[usize],
    ) -> Tensor<B, 2> {
        let p = self.premise.encode(premises, premise_lengths);
        let h = self.hypothesis.encode(hypotheses, hypothesis_lengths);
        self.classifier.forward(p, h)
    }

    pub fn forward_batch(&self, batch: &NliBatch<B>) -> Tensor<B, 2> {
        self.forward(
            batch.premises.clone(),
            &batch.premise_lengths,
            batch.hypotheses.clone(),
            &batch.hypothesis_lengths,
        )
    }

    pub fn forward_loss(&self, batch: &NliBatch<B>, l2: f64) -> NliOutput<B> {
        let scores    = self.forward_batch(batch);
        let data_loss = cross_entropy(scores.clone(), batch.labels.clone());
        let loss      = data_loss.clone() + self.classifier.l2_penalty().mul_scalar(l2);
        NliOutput { loss, data_loss, scores }
    }
}

/// Mean softmax cross-entropy against one-hot targets.
pub fn cross_entropy<B: Backend>(scores: Tensor<B, 2>, one_hot: Tensor<B, 2>) -> Tensor<B, 1> {
    (log_softmax(scores, 1) * one_hot).sum_dim(1).mean().neg()
}

/// Arg-max label of every score row.
pub fn predictions<B: Backend>(scores: Tensor<B, 2>) -> Vec<Label> {
    let [_, classes] = scores.dims();
    let values: Vec<f32> = scores.into_data().convert::<f32>().to_vec().unwrap_or_default();
    values
        .chunks(classes.max(1))
        .filter_map(|row| Label::from_scores(row).ok())
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{assert_close, row, serial, toy_batch, TestAutodiff, TestInner};

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model = NliModelConfig::new(4).with_encoder_hidden(6).init::<TestInner>(&device);
        let batch = toy_batch::<TestInner>(5, &device);
        assert_eq!(model.forward_batch(&batch).dims(), [5, 3]);
    }

    #[test]
    fn test_seeded_init_does_not_depend_on_first_use() {
        let _guard = serial();
        let device = Default::default();
        let cfg = NliModelConfig::new(4).with_encoder(EncoderKind::BiLstm).with_dropout_keep(1.0);
        let batch = toy_batch::<TestInner>(3, &device);

        TestInner::seed(5);
        let used_directly = cfg.init::<TestInner>(&device).forward_batch(&batch);

        TestInner::seed(5);
        let cloned_first = cfg.init::<TestInner>(&device).clone().forward_batch(&batch);

        for i in 0..3 {
            assert_close(&row(&used_directly, i), &row(&cloned_first, i), 1e-6);
        }
    }

    #[test]
    fn test_bilstm_and_bow_forward_shape() {
        let device = Default::default();
        for kind in [EncoderKind::BiLstm, EncoderKind::Bow] {
            let model = NliModelConfig::new(4).with_encoder(kind).with_merge_hidden(3).init::<TestInner>(&device);
            let batch = toy_batch::<TestInner>(2, &device);
            assert_eq!(model.forward_batch(&batch).dims(), [2, 3]);
        }
    }

    #[test]
    fn test_cross_entropy_of_uniform_scores_is_ln3() {
        let device = Default::default();
        let scores  = Tensor::<TestInner, 2>::zeros([4, 3], &device);
        let one_hot = Tensor::<TestInner, 2>::from_data(
            TensorData::new(vec![1.0f32, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0], [4, 3]),
            &device,
        );
        let ce = cross_entropy(scores, one_hot).into_scalar().elem::<f64>();
        approx::assert_relative_eq!(ce, 3f64.ln(), max_relative = 1e-5);
    }

    #[test]
    fn test_loss_includes_weighted_l2() {
        let device = Default::default();
        let model = NliModelConfig::new(4).with_dropout_keep(1.0).init::<TestAutodiff>(&device);
        let batch = toy_batch::<TestAutodiff>(3, &device);

        let out  = model.forward_loss(&batch, 0.5);
        let l2   = model.classifier.l2_penalty().into_scalar().elem::<f64>();
        let data = out.data_loss.into_scalar().elem::<f64>();
        let loss = out.loss.into_scalar().elem::<f64>();
        approx::assert_relative_eq!(loss, data + 0.5 * l2, max_relative = 1e-4);
    }

    #[test]
    fn test_predictions_take_argmax() {
        let device = Default::default();
        let scores = Tensor::<TestInner, 2>::from_data(
            TensorData::new(vec![0.1f32, 0.9, 0.0, 2.0, -1.0, 2.0], [2, 3]),
            &device,
        );
        assert_eq!(predictions(scores), vec![Label::Neutral, Label::Entailment]);
    }
}
