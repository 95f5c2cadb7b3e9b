// ============================================================
// Layer 5 — Pair Classifier
// ============================================================
// Maps a (premise vector, hypothesis vector) pair to one score
// per class.
//
//   premise    [B, Dp] ──► W_p (no bias) ──► [B, M] ┐
//                                                   ├─ concat ─► [B, 2M]
//   hypothesis [B, Dh] ──► W_h (no bias) ──► [B, M] ┘
//
//   repeat ff_layers times:
//       x = dropout(relu(x · W + b))                 [B, F]
//
//   scores = x · W_out + b_out                       [B, num_classes]
//
// Scores are raw: softmax belongs to the loss, not to the model.
// Weight matrices use Xavier-uniform init and biases start at zero.
//
// Reference: Glorot & Bengio (2010) Xavier initialisation
//            Srivastava et al. (2014) Dropout

use burn::{
    module::Param,
    nn::{Dropout, DropoutConfig, Initializer, Linear, LinearConfig},
    prelude::*,
    tensor::activation::relu,
};

#[derive(Config, Debug)]
pub struct PairClassifierConfig {
    pub premise_size:    usize,
    pub hypothesis_size: usize,
    pub merge_hidden:    usize,
    pub ff_hidden:       usize,
    #[config(default = 2)]
    pub ff_layers:       usize,
    #[config(default = 3)]
    pub num_classes:     usize,
    /// Probability of KEEPING a unit; 1.0 disables dropout.
    #[config(default = 1.0)]
    pub dropout_keep:    f64,
}

impl PairClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PairClassifier<B> {
        let hidden = (0..self.ff_layers)
            .map(|i| {
                let d_in = if i == 0 { 2 * self.merge_hidden } else { self.ff_hidden };
                xavier_linear(d_in, self.ff_hidden, true, device)
            })
            .collect();

        PairClassifier {
            premise_proj:    xavier_linear(self.premise_size, self.merge_hidden, false, device),
            hypothesis_proj: xavier_linear(self.hypothesis_size, self.merge_hidden, false, device),
            hidden,
            output:          xavier_linear(self.ff_hidden, self.num_classes, true, device),
            dropout:         DropoutConfig::new(1.0 - self.dropout_keep).init(),
        }
    }
}

fn xavier_linear<B: Backend>(d_in: usize, d_out: usize, bias: bool, device: &B::Device) -> Linear<B> {
    let mut linear = LinearConfig::new(d_in, d_out)
        .with_bias(bias)
        .with_initializer(Initializer::XavierUniform { gain: 1.0 })
        .init(device);
    if bias {
        linear.bias = Some(Param::from_tensor(Tensor::zeros([d_out], device)));
    }
    linear
}

#[derive(Module, Debug)]
pub struct PairClassifier<B: Backend> {
    pub premise_proj:    Linear<B>,
    pub hypothesis_proj: Linear<B>,
    pub hidden:          Vec<Linear<B>>,
    pub output:          Linear<B>,
    pub dropout:         Dropout,
}

/// Summary statistics of one weight matrix, for debug logging.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSummary {
    pub name: String,
    pub mean: f64,
    pub std:  f64,
    pub min:  f64,
    pub max:  f64,
}

impl<B: Backend> PairClassifier<B> {
    /// premise [B, Dp], hypothesis [B, Dh] → scores [B, num_classes]
    pub fn forward(&self, premise: Tensor<B, 2>, hypothesis: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = Tensor::cat(
            vec![self.premise_proj.forward(premise), self.hypothesis_proj.forward(hypothesis)],
            1,
        );
        for layer in &self.hidden {
            x = self.dropout.forward(relu(layer.forward(x)));
        }
        self.output.forward(x)
    }

    /// Σ ½‖W‖² over every weight matrix of the classifier (biases excluded).
    pub fn l2_penalty(&self) -> Tensor<B, 1> {
        let device = self.output.weight.device();
        self.named_weights()
            .into_iter()
            .map(|(_, w)| (w.clone() * w).sum())
            .fold(Tensor::zeros([1], &device), |acc, sq| acc + sq)
            .mul_scalar(0.5)
    }

    pub fn weight_summaries(&self) -> Vec<WeightSummary> {
        self.named_weights()
            .into_iter()
            .map(|(name, w)| {
                let mean = w.clone().mean().into_scalar().elem::<f64>();
                let var  = (w.clone() - mean).powf_scalar(2.0).mean().into_scalar().elem::<f64>();
                WeightSummary {
                    name,
                    mean,
                    std: var.sqrt(),
                    min: w.clone().min().into_scalar().elem::<f64>(),
                    max: w.max().into_scalar().elem::<f64>(),
                }
            })
            .collect()
    }

    fn named_weights(&self) -> Vec<(String, Tensor<B, 2>)> {
        let mut weights = vec![
            ("premise_proj".to_string(), self.premise_proj.weight.val()),
            ("hypothesis_proj".to_string(), self.hypothesis_proj.weight.val()),
        ];
        for (i, layer) in self.hidden.iter().enumerate() {
            weights.push((format!("hidden.{i}"), layer.weight.val()));
        }
        weights.push(("output".to_string(), self.output.weight.val()));
        weights
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{assert_close, TestAutodiff};

    type B = TestAutodiff;

    fn config(keep: f64) -> PairClassifierConfig {
        PairClassifierConfig::new(4, 6, 5, 7).with_dropout_keep(keep)
    }

    fn inputs(device: &<B as Backend>::Device) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let p: Vec<f32> = (0..8).map(|v| v as f32 / 8.0).collect();
        let h: Vec<f32> = (0..12).map(|v| 1.0 - v as f32 / 12.0).collect();
        (
            Tensor::from_data(TensorData::new(p, [2, 4]), device),
            Tensor::from_data(TensorData::new(h, [2, 6]), device),
        )
    }

    #[test]
    fn test_scores_shape() {
        let device = Default::default();
        let clf = config(1.0).init::<B>(&device);
        let (p, h) = inputs(&device);
        assert_eq!(clf.forward(p, h).dims(), [2, 3]);
        assert_eq!(clf.hidden.len(), 2);
    }

    #[test]
    fn test_keep_one_is_deterministic_in_training() {
        let device = Default::default();
        let clf = config(1.0).init::<B>(&device);
        let (p, h) = inputs(&device);

        let a: Vec<f32> = clf.forward(p.clone(), h.clone()).into_data().to_vec().unwrap();
        let b: Vec<f32> = clf.forward(p, h).into_data().to_vec().unwrap();
        assert_close(&a, &b, 0.0);
    }

    #[test]
    fn test_projections_have_no_bias_and_biases_start_at_zero() {
        let clf = config(1.0).init::<B>(&Default::default());
        assert!(clf.premise_proj.bias.is_none());
        assert!(clf.hypothesis_proj.bias.is_none());

        let bias: Vec<f32> = clf.output.bias.as_ref().unwrap().val().into_data().to_vec().unwrap();
        assert!(bias.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_l2_penalty_is_half_sum_of_squares() {
        let clf = config(1.0).init::<B>(&Default::default());
        let expected: f64 = clf
            .named_weights()
            .into_iter()
            .map(|(_, w)| {
                let values: Vec<f32> = w.into_data().to_vec().unwrap();
                values.iter().map(|&v| 0.5 * (v as f64) * (v as f64)).sum::<f64>()
            })
            .sum();
        let got = clf.l2_penalty().into_scalar().elem::<f64>();
        approx::assert_relative_eq!(got, expected, max_relative = 1e-4);
    }

    #[test]
    fn test_weight_summaries_cover_every_matrix() {
        let clf = config(1.0).init::<B>(&Default::default());
        let names: Vec<String> = clf.weight_summaries().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["premise_proj", "hypothesis_proj", "hidden.0", "hidden.1", "output"]);
    }
}
