// Shared fixtures for unit tests across layers.

use std::{
    fs,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use burn::{
    backend::{Autodiff, NdArray},
    prelude::*,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::application::config::{RunPaths, TrainConfig};
use crate::data::{
    batcher::{NliBatch, NliBatcher},
    dataset::NliDataset,
    embeddings::EmbeddingMatrix,
};
use crate::domain::{example::NliExample, label::Label};
use crate::ml::model::NliModelConfig;
use burn::data::dataloader::batcher::Batcher;

pub type TestInner    = NdArray;
pub type TestAutodiff = Autodiff<NdArray>;

/// Width of the toy embedding table.
pub const TOY_DIM: usize = 4;
const TOY_ROWS: usize = 8;

static SERIAL: Mutex<()> = Mutex::new(());

/// Burn's NdArray RNG is process-wide; tests that seed it and expect
/// reproducible parameters hold this guard for their whole body.
pub fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn row<B: Backend>(t: &Tensor<B, 2>, i: usize) -> Vec<f32> {
    let [_, cols] = t.dims();
    let values: Vec<f32> = t.clone().into_data().to_vec().unwrap();
    values[i * cols..(i + 1) * cols].to_vec()
}

pub fn assert_close(a: &[f32], b: &[f32], tol: f32) {
    assert_eq!(a.len(), b.len(), "length mismatch");
    for (x, y) in a.iter().zip(b) {
        approx::assert_abs_diff_eq!(x, y, epsilon = tol);
    }
}

/// 8 × 4 values; row 0 (padding id) is zero, the rest are fixed random.
fn toy_table() -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(7);
    (0..TOY_ROWS * TOY_DIM)
        .map(|i| if i < TOY_DIM { 0.0 } else { rng.gen_range(-1.0..1.0) })
        .collect()
}

pub fn toy_embeddings() -> Arc<EmbeddingMatrix> {
    Arc::new(EmbeddingMatrix::new(TOY_ROWS, TOY_DIM, toy_table()).unwrap())
}

/// Example i has label i % 3 and its premise starts with id 1 + label,
/// so the classes are separable. Lengths vary between 1 and 3.
pub fn toy_examples(n: usize) -> Vec<NliExample> {
    (0..n)
        .map(|i| {
            let label = Label::ALL[i % 3];
            let premise: Vec<u32> = (0..1 + i % 3)
                .map(|t| if t == 0 { 1 + label.index() as u32 } else { 4 + ((i + t) % 4) as u32 })
                .collect();
            let hypothesis = vec![4 + (i % 4) as u32; 1 + i % 2];
            NliExample::new(premise, hypothesis, label)
        })
        .collect()
}

pub fn toy_dataset(n: usize) -> NliDataset {
    NliDataset::new(toy_examples(n))
}

pub fn toy_batch<B: Backend>(n: usize, device: &B::Device) -> NliBatch<B> {
    NliBatcher::<B>::new(toy_embeddings(), device.clone()).batch(toy_examples(n))
}

/// Small, dropout-free configuration matching the toy table.
pub fn tiny_config() -> TrainConfig {
    let model = NliModelConfig::new(TOY_DIM)
        .with_encoder_hidden(6)
        .with_merge_hidden(6)
        .with_ff_hidden(8)
        .with_dropout_keep(1.0);

    let mut cfg = TrainConfig::new(model);
    cfg.lr = 0.01;
    cfg.batch_size = 4;
    cfg.epochs = 1;
    cfg.checkpoint_every = 0;
    cfg.print_every = 0;
    cfg.seed = 11;
    cfg
}

fn write_split(dir: &Path, split: &str, examples: &[NliExample]) {
    let join = |ids: &[u32]| ids.iter().map(u32::to_string).collect::<Vec<_>>().join(" ");
    let premises: Vec<String>   = examples.iter().map(|ex| join(&ex.premise)).collect();
    let hypotheses: Vec<String> = examples.iter().map(|ex| join(&ex.hypothesis)).collect();
    let labels: Vec<&str>       = examples.iter().map(|ex| ex.label.as_str()).collect();

    fs::write(dir.join(format!("{split}.ids.premise")), premises.join("\n") + "\n").unwrap();
    fs::write(dir.join(format!("{split}.ids.hypothesis")), hypotheses.join("\n") + "\n").unwrap();
    fs::write(dir.join(format!("{split}.goldlabel")), labels.join("\n") + "\n").unwrap();
}

/// Lay out a complete toy data directory under `root` (vocabulary,
/// safetensors embeddings, train/dev/test splits) and return paths
/// pointing at it, with checkpoints in `root/train` and logs in `root/log`.
pub fn write_toy_corpus(root: &Path) -> RunPaths {
    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    let vocab: Vec<String> = (0..TOY_ROWS).map(|i| format!("tok{i}")).collect();
    fs::write(data_dir.join("vocab.dat"), vocab.join("\n") + "\n").unwrap();

    let bytes: Vec<u8> = toy_table().iter().flat_map(|v| v.to_le_bytes()).collect();
    let view = safetensors::tensor::TensorView::new(safetensors::tensor::Dtype::F32, vec![TOY_ROWS, TOY_DIM], &bytes).unwrap();
    let embed_path = RunPaths::default_embed_path(&data_dir, TOY_DIM);
    let out = safetensors::serialize([("glove", view)], None::<std::collections::HashMap<String, String>>).unwrap();
    fs::write(&embed_path, out).unwrap();

    write_split(&data_dir, "train", &toy_examples(10));
    write_split(&data_dir, "dev", &toy_examples(6));
    write_split(&data_dir, "test", &toy_examples(5));

    // The embedding file sits at its default name, so it is found from the config's width.
    RunPaths {
        vocab_path:     data_dir.join("vocab.dat"),
        embed_path:     None,
        embedding_key:  "glove".to_string(),
        data_dir,
        train_dir:      root.join("train"),
        load_train_dir: None,
        log_dir:        root.join("log"),
    }
}
