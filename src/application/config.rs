// ============================================================
// Layer 2 — Run Configuration
// ============================================================
// Immutable values built once by the CLI layer and passed down
// by reference. Nothing below the application layer reads flags.
//
//   TrainConfig  — hyperparameters + model architecture
//                  (serialised next to checkpoints and into
//                   log_dir/run_config.json)
//   RunPaths     — where inputs come from and outputs go
//   DataLimits   — sample caps and the evaluation split
//
// A grid-search trial never mutates the base config: it derives
// a new value with `with_trial(lr, keep, l2)`.
//
// Reference: Rust Book §5 (Structs), §9 (Error Handling)

use std::{fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::label::Label;
use crate::ml::model::NliModelConfig;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("dropout keep probability must be in (0, 1], got {0}")]
    KeepProbability(f64),

    #[error("batch size must be at least 1")]
    BatchSize,

    #[error("the classifier predicts {expected} classes, got num_classes = {0}", expected = Label::COUNT)]
    NumClasses(usize),

    #[error("at least one feed-forward layer is required")]
    FeedForwardLayers,

    #[error("learning rate must be positive and finite, got {0}")]
    LearningRate(f64),

    #[error("L2 strength must be non-negative and finite, got {0}")]
    L2(f64),

    #[error("grid list '{0}' is empty")]
    EmptyGrid(&'static str),

    #[error("embedding file holds {found}-wide vectors but embedding_size is {expected}")]
    EmbeddingSize { expected: usize, found: usize },
}

// ─── Optimizer ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adam,
    Sgd,
}

impl FromStr for OptimizerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "adam" => Ok(OptimizerKind::Adam),
            "sgd"  => Ok(OptimizerKind::Sgd),
            other  => Err(format!("unknown optimizer '{other}' (expected adam or sgd)")),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OptimizerKind::Adam => "adam",
            OptimizerKind::Sgd  => "sgd",
        })
    }
}

// ─── Evaluation split ────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvalSplit {
    Dev,
    Test,
}

impl EvalSplit {
    pub fn as_str(self) -> &'static str {
        match self {
            EvalSplit::Dev  => "dev",
            EvalSplit::Test => "test",
        }
    }
}

impl FromStr for EvalSplit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev"  => Ok(EvalSplit::Dev),
            "test" => Ok(EvalSplit::Test),
            other  => Err(format!("unknown split '{other}' (expected dev or test)")),
        }
    }
}

impl fmt::Display for EvalSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Training Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub lr:               f64,
    /// L2 strength λ applied to Σ ½‖W‖² of the classifier weights
    pub l2:               f64,
    pub batch_size:       usize,
    /// Epochs to run in this invocation (a resumed run adds to the old ones)
    pub epochs:           usize,
    /// Global gradient-norm ceiling; ≤ 0 disables clipping
    pub max_grad_norm:    f64,
    pub optimizer:        OptimizerKind,
    /// Seeds parameter init and the per-epoch shuffle
    pub seed:             u64,
    /// Save every N iterations; 0 = only at the end
    pub checkpoint_every: usize,
    /// Newest checkpoints to retain; 0 = keep all
    pub keep_checkpoints: usize,
    /// Log every N iterations; 0 = silent
    pub print_every:      usize,
    pub model:            NliModelConfig,
}

impl TrainConfig {
    /// The command-line defaults around a given architecture.
    #[cfg(test)]
    pub fn new(model: NliModelConfig) -> Self {
        Self {
            lr:               1e-4,
            l2:               0.01,
            batch_size:       64,
            epochs:           10,
            max_grad_norm:    10.0,
            optimizer:        OptimizerKind::Adam,
            seed:             244,
            checkpoint_every: 1000,
            keep_checkpoints: 0,
            print_every:      100,
            model,
        }
    }

    pub fn dropout_keep(&self) -> f64 {
        self.model.dropout_keep
    }

    /// Copy of this config with one grid point's hyperparameters.
    pub fn with_trial(&self, lr: f64, keep: f64, l2: f64) -> Self {
        let mut cfg = self.clone();
        cfg.lr = lr;
        cfg.l2 = l2;
        cfg.model.dropout_keep = keep;
        cfg
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let keep = self.dropout_keep();
        if !(keep > 0.0 && keep <= 1.0) {
            return Err(ConfigError::KeepProbability(keep));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::BatchSize);
        }
        if self.model.num_classes != Label::COUNT {
            return Err(ConfigError::NumClasses(self.model.num_classes));
        }
        if self.model.ff_layers == 0 {
            return Err(ConfigError::FeedForwardLayers);
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(ConfigError::LearningRate(self.lr));
        }
        if !(self.l2.is_finite() && self.l2 >= 0.0) {
            return Err(ConfigError::L2(self.l2));
        }
        Ok(())
    }
}

// ─── Paths ───────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPaths {
    pub data_dir:       PathBuf,
    pub vocab_path:     PathBuf,
    /// Explicit embedding file; `None` derives it from the embedding size
    pub embed_path:     Option<PathBuf>,
    pub embedding_key:  String,
    /// Checkpoints are written here
    pub train_dir:      PathBuf,
    /// Checkpoints are resumed from here (defaults to `train_dir`)
    pub load_train_dir: Option<PathBuf>,
    pub log_dir:        PathBuf,
}

impl RunPaths {
    pub fn resume_dir(&self) -> &PathBuf {
        self.load_train_dir.as_ref().unwrap_or(&self.train_dir)
    }

    /// Embedding file for vectors of `embedding_size`: the explicit
    /// path if one was given, otherwise the default name in `data_dir`.
    pub fn embed_file(&self, embedding_size: usize) -> PathBuf {
        self.embed_path
            .clone()
            .unwrap_or_else(|| Self::default_embed_path(&self.data_dir, embedding_size))
    }

    pub fn default_embed_path(data_dir: &std::path::Path, embedding_size: usize) -> PathBuf {
        data_dir.join(format!("glove.trimmed.{embedding_size}.safetensors"))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DataLimits {
    pub num_train:  Option<usize>,
    pub num_eval:   Option<usize>,
    pub eval_split: EvalSplit,
}

impl Default for DataLimits {
    fn default() -> Self {
        Self { num_train: None, num_eval: None, eval_split: EvalSplit::Dev }
    }
}
