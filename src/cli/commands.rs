// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `eval` and `search`.
// Flags shared between them live in flattened argument groups:
//
//   HyperArgs  — hyperparameters + architecture  → TrainConfig
//   PathArgs   — data files and run directories  → RunPaths
//   LimitArgs  — sample caps and eval split      → DataLimits
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::{
    config::{DataLimits, EvalSplit, OptimizerKind, RunPaths, TrainConfig},
    search_use_case::SearchGrid,
};
use crate::ml::{encoder::EncoderKind, model::NliModelConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train (or resume) a model and evaluate it on the dev/test split
    Train(TrainArgs),

    /// Evaluate the newest checkpoint in --train-dir
    Eval(EvalArgs),

    /// Grid search over learning rate × dropout keep × L2 strength
    Search(SearchArgs),
}

// ─── Shared groups ───────────────────────────────────────────────────────────
#[derive(Args, Debug, Clone)]
pub struct HyperArgs {
    /// Learning rate
    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    /// Probability of keeping a unit in the classifier's dropout layers
    #[arg(long, default_value_t = 0.8)]
    pub dropout_keep: f64,

    /// L2 regularisation strength on the classifier weights
    #[arg(long, default_value_t = 0.01)]
    pub reg_lambda: f64,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Epochs to run (added on top of a resumed checkpoint)
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Clip gradients to this global norm (0 disables clipping)
    #[arg(long, default_value_t = 10.0)]
    pub max_gradient_norm: f64,

    /// Statement encoder: lstm, bilstm or bow
    #[arg(long, default_value = "lstm")]
    pub encoder: EncoderKind,

    /// LSTM state size per direction
    #[arg(long, default_value_t = 100)]
    pub lstm_hidden_size: usize,

    /// Width of each statement after its merge projection
    #[arg(long, default_value_t = 100)]
    pub stmt_hidden_size: usize,

    #[arg(long, default_value_t = 100)]
    pub ff_hidden_size: usize,

    #[arg(long, default_value_t = 2)]
    pub ff_layers: usize,

    /// Number of output classes (must be 3)
    #[arg(long, default_value_t = 3)]
    pub output_size: usize,

    /// Width of the pretrained embedding vectors
    #[arg(long, default_value_t = 300)]
    pub embedding_size: usize,

    /// adam or sgd
    #[arg(long, default_value = "adam")]
    pub optimizer: OptimizerKind,

    #[arg(long, default_value_t = 244)]
    pub seed: u64,

    /// Save a checkpoint every N iterations (0 = only at the end)
    #[arg(long, default_value_t = 1000)]
    pub checkpoint_every: usize,

    /// Number of newest checkpoints to keep (0 = keep all)
    #[arg(long, default_value_t = 0)]
    pub keep: usize,

    /// Log progress every N iterations (0 = only per epoch)
    #[arg(long, default_value_t = 100)]
    pub print_every: usize,
}

/// Convert CLI HyperArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<HyperArgs> for TrainConfig {
    fn from(a: HyperArgs) -> Self {
        let model = NliModelConfig::new(a.embedding_size)
            .with_encoder(a.encoder)
            .with_encoder_hidden(a.lstm_hidden_size)
            .with_merge_hidden(a.stmt_hidden_size)
            .with_ff_hidden(a.ff_hidden_size)
            .with_ff_layers(a.ff_layers)
            .with_num_classes(a.output_size)
            .with_dropout_keep(a.dropout_keep);

        TrainConfig {
            lr:               a.lr,
            l2:               a.reg_lambda,
            batch_size:       a.batch_size,
            epochs:           a.epochs,
            max_grad_norm:    a.max_gradient_norm,
            optimizer:        a.optimizer,
            seed:             a.seed,
            checkpoint_every: a.checkpoint_every,
            keep_checkpoints: a.keep,
            print_every:      a.print_every,
            model,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PathArgs {
    /// Directory holding the {split}.ids.* and {split}.goldlabel files
    #[arg(long, default_value = "data/snli")]
    pub data_dir: PathBuf,

    /// Vocabulary file [default: <data-dir>/vocab.dat]
    #[arg(long)]
    pub vocab_path: Option<PathBuf>,

    /// Embedding safetensors file
    /// [default: <data-dir>/glove.trimmed.<embedding-size>.safetensors]
    #[arg(long)]
    pub embed_path: Option<PathBuf>,

    /// Tensor name inside the embedding file
    #[arg(long, default_value = "glove")]
    pub embedding_key: String,

    /// Directory checkpoints are written to
    #[arg(long, default_value = "train")]
    pub train_dir: PathBuf,

    /// Directory checkpoints are restored from [default: --train-dir]
    #[arg(long)]
    pub load_train_dir: Option<PathBuf>,

    /// Directory for run_config.json and metrics.csv
    #[arg(long, default_value = "log")]
    pub log_dir: PathBuf,
}

impl PathArgs {
    pub fn resolve(self) -> RunPaths {
        RunPaths {
            vocab_path:     self.vocab_path.unwrap_or_else(|| self.data_dir.join("vocab.dat")),
            embed_path:     self.embed_path,
            embedding_key:  self.embedding_key,
            data_dir:       self.data_dir,
            train_dir:      self.train_dir,
            load_train_dir: self.load_train_dir,
            log_dir:        self.log_dir,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct LimitArgs {
    /// Use only the first N training examples
    #[arg(long)]
    pub num_train: Option<usize>,

    /// Use only the first N evaluation examples
    #[arg(long)]
    pub num_eval: Option<usize>,

    /// Split to evaluate on: dev or test
    #[arg(long, default_value = "dev")]
    pub eval_split: EvalSplit,
}

impl From<LimitArgs> for DataLimits {
    fn from(a: LimitArgs) -> Self {
        DataLimits { num_train: a.num_train, num_eval: a.num_eval, eval_split: a.eval_split }
    }
}

// ─── Subcommands ─────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub hyper:  HyperArgs,

    #[command(flatten)]
    pub paths:  PathArgs,

    #[command(flatten)]
    pub limits: LimitArgs,
}

#[derive(Args, Debug)]
pub struct EvalArgs {
    #[command(flatten)]
    pub paths:  PathArgs,

    #[command(flatten)]
    pub limits: LimitArgs,

    /// Override the batch size stored with the checkpoint
    #[arg(long)]
    pub batch_size: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[command(flatten)]
    pub hyper:  HyperArgs,

    #[command(flatten)]
    pub paths:  PathArgs,

    #[command(flatten)]
    pub limits: LimitArgs,

    /// Learning rates to try, comma separated [default: 1e-8 … 1e-2]
    #[arg(long, value_delimiter = ',')]
    pub lr_grid: Vec<f64>,

    /// Keep probabilities to try [default: 0.5 … 1.0]
    #[arg(long, value_delimiter = ',')]
    pub keep_grid: Vec<f64>,

    /// L2 strengths to try [default: 1e-4 … 1]
    #[arg(long, value_delimiter = ',')]
    pub l2_grid: Vec<f64>,

    /// JSON results table (reloaded to skip finished points)
    #[arg(long, default_value = "data/hyperparams/grid.json")]
    pub results_file: PathBuf,
}

impl SearchArgs {
    /// Lists that were not given fall back to the default grid.
    pub fn grid(&self) -> SearchGrid {
        let defaults = SearchGrid::default();
        let pick = |given: &Vec<f64>, default: Vec<f64>| if given.is_empty() { default } else { given.clone() };
        SearchGrid {
            lrs:   pick(&self.lr_grid, defaults.lrs),
            keeps: pick(&self.keep_grid, defaults.keeps),
            l2s:   pick(&self.l2_grid, defaults.l2s),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn parse(args: &[&str]) -> Commands {
        Cli::try_parse_from(std::iter::once("nli-trainer").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn test_train_defaults_convert() {
        let Commands::Train(args) = parse(&["train"]) else { panic!("expected train") };
        let paths = args.paths.clone().resolve();
        let cfg: TrainConfig = args.hyper.into();

        assert_eq!(cfg.lr, 1e-4);
        assert_eq!(cfg.dropout_keep(), 0.8);
        assert_eq!(cfg.model.encoder, EncoderKind::Lstm);
        assert_eq!(cfg.optimizer, OptimizerKind::Adam);
        assert!(cfg.validate().is_ok());
        assert_eq!(paths.embed_file(cfg.model.embedding_size), PathBuf::from("data/snli/glove.trimmed.300.safetensors"));
        assert_eq!(paths.vocab_path, PathBuf::from("data/snli/vocab.dat"));
        assert_eq!(paths.resume_dir(), &PathBuf::from("train"));
    }

    #[test]
    fn test_train_flags() {
        let Commands::Train(args) = parse(&[
            "train", "--encoder", "bilstm", "--optimizer", "sgd", "--reg-lambda", "0.5",
            "--embedding-size", "50", "--eval-split", "test", "--num-train", "100",
        ]) else {
            panic!("expected train")
        };
        let limits: DataLimits = args.limits.into();
        let paths = args.paths.resolve();
        let cfg: TrainConfig = args.hyper.into();

        assert_eq!(cfg.model.encoder, EncoderKind::BiLstm);
        assert_eq!(cfg.optimizer, OptimizerKind::Sgd);
        assert_eq!(cfg.l2, 0.5);
        assert_eq!(limits.eval_split, EvalSplit::Test);
        assert_eq!(limits.num_train, Some(100));
        assert_eq!(paths.embed_file(cfg.model.embedding_size), PathBuf::from("data/snli/glove.trimmed.50.safetensors"));
    }

    #[test]
    fn test_unknown_encoder_is_rejected() {
        assert!(Cli::try_parse_from(["nli-trainer", "train", "--encoder", "gru"]).is_err());
    }

    #[test]
    fn test_search_grid_lists() {
        let Commands::Search(args) = parse(&["search", "--lr-grid", "0.1,0.01", "--l2-grid", "0"]) else {
            panic!("expected search")
        };
        let grid = args.grid();
        assert_eq!(grid.lrs, vec![0.1, 0.01]);
        assert_eq!(grid.keeps, SearchGrid::default().keeps);
        assert_eq!(grid.l2s, vec![0.0]);
        assert_eq!(args.results_file, PathBuf::from("data/hyperparams/grid.json"));
    }
}
