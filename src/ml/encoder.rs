// ============================================================
// Layer 5 — Statement Encoder
// ============================================================
// Reduces a padded batch of embedded statements to one vector
// per example.
//
//   input:   [batch, max_len, embedding_dim]  + true lengths
//   output:  [batch, output_size]
//
// Three interchangeable strategies, chosen by EncoderKind:
//
//   Lstm    one LSTM run over the padded batch; the output at each
//           example's own last valid step (length − 1) is gathered.
//           Taking the last padded step instead would mix padding
//           into every example shorter than the batch maximum.
//
//   BiLstm  Lstm output ++ the same selection from a second LSTM run
//           over each sequence reversed inside its true length, so
//           the backward pass also starts at a real token.
//
//   Bow     mean of the embedding vectors over valid positions.
//
// Reference: Burn Book §3 (Building Blocks)
//            Hochreiter & Schmidhuber (1997) LSTM

use std::{fmt, str::FromStr};

use burn::{
    nn::{Lstm, LstmConfig},
    prelude::*,
};
use serde::{Deserialize, Serialize};

/// Which statement-encoding strategy to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderKind {
    Lstm,
    BiLstm,
    Bow,
}

impl FromStr for EncoderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lstm"   => Ok(EncoderKind::Lstm),
            "bilstm" => Ok(EncoderKind::BiLstm),
            "bow"    => Ok(EncoderKind::Bow),
            other    => Err(format!("unknown encoder '{other}' (expected lstm, bilstm or bow)")),
        }
    }
}

impl fmt::Display for EncoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EncoderKind::Lstm   => "lstm",
            EncoderKind::BiLstm => "bilstm",
            EncoderKind::Bow    => "bow",
        })
    }
}

/// Capability shared by every encoder variant.
pub trait SentenceEncoder<B: Backend> {
    /// `statements`: [batch, max_len, d_input], `lengths[i]` ∈ 1..=max_len.
    fn encode(&self, statements: Tensor<B, 3>, lengths: &[usize]) -> Tensor<B, 2>;

    /// Width of the vectors returned by `encode`.
    fn output_size(&self) -> usize;
}

#[derive(Config, Debug)]
pub struct StatementEncoderConfig {
    pub kind:     EncoderKind,
    pub d_input:  usize,
    pub d_hidden: usize,
}

impl StatementEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> StatementEncoder<B> {
        let cell = || LstmConfig::new(self.d_input, self.d_hidden, true).init(device);
        let (forward_cell, backward_cell, output_size) = match self.kind {
            EncoderKind::Bow    => (None, None, self.d_input),
            EncoderKind::Lstm   => (Some(cell()), None, self.d_hidden),
            EncoderKind::BiLstm => (Some(cell()), Some(cell()), 2 * self.d_hidden),
        };
        StatementEncoder { forward_cell, backward_cell, output_size }
    }
}

/// One encoder instance; its cells are shared by every timestep and batch it sees.
/// No cells = bag of words, forward only = LSTM, both = BiLSTM.
#[derive(Module, Debug)]
pub struct StatementEncoder<B: Backend> {
    pub forward_cell:  Option<Lstm<B>>,
    pub backward_cell: Option<Lstm<B>>,
    pub output_size:   usize,
}

impl<B: Backend> SentenceEncoder<B> for StatementEncoder<B> {
    fn encode(&self, statements: Tensor<B, 3>, lengths: &[usize]) -> Tensor<B, 2> {
        match (&self.forward_cell, &self.backward_cell) {
            (None, _) => masked_mean(statements, lengths),
            (Some(fw), None) => last_valid_output(fw, statements, lengths),
            (Some(fw), Some(bw)) => {
                let reversed = reverse_within_lengths(statements.clone(), lengths);
                let forward  = last_valid_output(fw, statements, lengths);
                let backward = last_valid_output(bw, reversed, lengths);
                Tensor::cat(vec![forward, backward], 1)
            }
        }
    }

    fn output_size(&self) -> usize {
        self.output_size
    }
}

/// Run `cell` over the whole padded batch and gather step `length − 1` per row.
fn last_valid_output<B: Backend>(cell: &Lstm<B>, statements: Tensor<B, 3>, lengths: &[usize]) -> Tensor<B, 2> {
    let [batch, _, _] = statements.dims();
    let (outputs, _state) = cell.forward(statements, None); // [batch, max_len, hidden]
    let [_, _, hidden] = outputs.dims();

    let last: Vec<i32> = lengths.iter().map(|&len| len.saturating_sub(1) as i32).collect();
    let index = Tensor::<B, 1, Int>::from_ints(last.as_slice(), &outputs.device())
        .reshape([batch, 1, 1])
        .expand([batch, 1, hidden]);

    outputs.gather(1, index).reshape([batch, hidden])
}

/// Reverse the first `length` steps of each row; padding stays at the tail.
fn reverse_within_lengths<B: Backend>(statements: Tensor<B, 3>, lengths: &[usize]) -> Tensor<B, 3> {
    let [batch, max_len, dim] = statements.dims();
    let order: Vec<i32> = lengths
        .iter()
        .flat_map(|&len| (0..max_len).map(move |t| if t < len { (len - 1 - t) as i32 } else { t as i32 }))
        .collect();
    let index = Tensor::<B, 1, Int>::from_ints(order.as_slice(), &statements.device())
        .reshape([batch, max_len, 1])
        .expand([batch, max_len, dim]);

    statements.gather(1, index)
}

/// Mean over valid positions only; padded steps are masked out.
fn masked_mean<B: Backend>(statements: Tensor<B, 3>, lengths: &[usize]) -> Tensor<B, 2> {
    let [batch, max_len, dim] = statements.dims();
    let device = statements.device();

    let mask: Vec<f32> = lengths
        .iter()
        .flat_map(|&len| (0..max_len).map(move |t| if t < len { 1.0 } else { 0.0 }))
        .collect();
    let mask = Tensor::<B, 3>::from_data(TensorData::new(mask, [batch, max_len, 1]), &device);

    let counts: Vec<f32> = lengths.iter().map(|&len| len.max(1) as f32).collect();
    let counts = Tensor::<B, 2>::from_data(TensorData::new(counts, [batch, 1]), &device);

    (statements * mask).sum_dim(1).reshape([batch, dim]) / counts
}
