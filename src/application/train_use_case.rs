// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run in order:
//
//   Step 1: Validate the configuration        (Layer 2)
//   Step 2: Load vocabulary + embeddings      (Layer 4 - data)
//   Step 3: Load train and eval splits        (Layer 4 - data)
//   Step 4: Build or restore the model        (Layer 5 - ml, Layer 6 - infra)
//   Step 5: Save config, run training loop    (Layer 5 - ml)
//   Step 6: Evaluate on the eval split        (Layer 5 - ml)
//
// Steps 4–6 live in `run_trial`, which the grid search reuses
// for every grid point, so a search with a single point and a
// plain training run do exactly the same work.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{Context, Result};
use burn::{module::AutodiffModule, prelude::*, tensor::backend::AutodiffBackend};
use std::{path::PathBuf, sync::Arc};

use crate::application::config::{ConfigError, DataLimits, RunPaths, TrainConfig};
use crate::data::{
    dataset::NliDataset,
    embeddings::EmbeddingMatrix,
    error::DataError,
    loader::{validate_ids, SplitLoader},
    vocab::Vocabulary,
};
use crate::domain::traits::ExampleSource;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    results_store::TrialMetrics,
};
use crate::ml::{evaluator::evaluate, trainer::TrainingRun, TrainBackend};

// ─── Corpus ──────────────────────────────────────────────────────────────────
/// Embedding table plus a source of labelled splits whose ids are
/// checked against that table.
pub struct Corpus {
    pub embeddings: Arc<EmbeddingMatrix>,
    source:         Box<dyn ExampleSource>,
}

impl Corpus {
    pub fn new(embeddings: Arc<EmbeddingMatrix>, source: Box<dyn ExampleSource>) -> Self {
        Self { embeddings, source }
    }

    /// Load vocabulary and embeddings and point at the split files.
    /// Both files must exist and agree on the vocabulary size.
    pub fn open(paths: &RunPaths, embedding_size: usize) -> Result<Self> {
        let vocab = Vocabulary::load(&paths.vocab_path)?;
        let embeddings = EmbeddingMatrix::load(paths.embed_file(embedding_size), &paths.embedding_key)?;

        if vocab.len() != embeddings.rows() {
            return Err(DataError::VocabEmbeddingMismatch { vocab: vocab.len(), rows: embeddings.rows() }.into());
        }
        if embeddings.dim() != embedding_size {
            return Err(ConfigError::EmbeddingSize { expected: embedding_size, found: embeddings.dim() }.into());
        }

        Ok(Self::new(Arc::new(embeddings), Box::new(SplitLoader::new(&paths.data_dir))))
    }

    pub fn split(&self, name: &str, limit: Option<usize>) -> Result<Arc<NliDataset>> {
        let examples = self
            .source
            .load_split(name, limit)
            .with_context(|| format!("Cannot load the '{name}' split"))?;
        validate_ids(&examples, self.embeddings.rows())?;
        let dataset = NliDataset::new(examples);

        let [entailment, neutral, contradiction] = dataset.label_counts();
        tracing::info!(
            "'{}' split: {} examples ({} entailment, {} neutral, {} contradiction)",
            name,
            dataset.examples().len(),
            entailment,
            neutral,
            contradiction,
        );
        Ok(Arc::new(dataset))
    }
}

// ─── One run ─────────────────────────────────────────────────────────────────
/// Where a run reads and writes its state.
#[derive(Debug, Clone)]
pub struct TrialDirs {
    pub train_dir:   PathBuf,
    /// `None` always starts from a fresh model
    pub resume_from: Option<PathBuf>,
    pub log_dir:     PathBuf,
}

/// Build (or restore), train and evaluate one model.
pub fn run_trial<B: AutodiffBackend>(
    cfg:    &TrainConfig,
    corpus: &Corpus,
    train:  Arc<NliDataset>,
    eval:   Arc<NliDataset>,
    dirs:   &TrialDirs,
    device: &B::Device,
) -> Result<TrialMetrics> {
    cfg.validate()?;

    // Seed before init so a fresh model is reproducible.
    B::seed(cfg.seed);
    let model = cfg.model.init::<B>(device);

    let restored = match &dirs.resume_from {
        Some(dir) => CheckpointManager::new(dir, 0).load_latest(model.clone(), device)?,
        None => None,
    };
    let (model, start_iteration) = match restored {
        Some(found) => found,
        None => {
            tracing::info!(
                "Starting from a fresh {} model with {} parameters",
                cfg.model.encoder,
                model.num_params()
            );
            (model, 0)
        }
    };

    let checkpoints = CheckpointManager::new(&dirs.train_dir, cfg.keep_checkpoints);
    checkpoints.save_config(cfg)?;
    let metrics = MetricsLogger::new(&dirs.log_dir)?;
    metrics.log_run_config(cfg)?;

    let run = TrainingRun::<B> {
        cfg,
        dataset:     train,
        embeddings:  corpus.embeddings.clone(),
        checkpoints: &checkpoints,
        metrics:     Some(&metrics),
        device:      device.clone(),
    };
    let (model, summary) = run.run(model, start_iteration)?;

    // model.valid() → inner backend, dropout disabled
    let report = evaluate(&model.valid(), eval, corpus.embeddings.clone(), cfg.batch_size, device);

    tracing::info!(
        "Finished at iteration {} | train_acc {:.2}% | eval_acc {:.2}% | eval_loss {:.4}",
        summary.iterations,
        summary.train_accuracy * 100.0,
        report.accuracy * 100.0,
        report.loss,
    );
    tracing::info!("Epoch metrics written to '{}'", metrics.csv_path().display());

    Ok(TrialMetrics {
        epochs_run:     summary.epochs_run,
        iterations:     summary.iterations,
        train_accuracy: summary.train_accuracy,
        train_loss:     summary.train_loss,
        eval_accuracy:  report.accuracy,
        eval_loss:      report.loss,
        confusion:      report.confusion,
    })
}

// ─── TrainUseCase ────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    cfg:    TrainConfig,
    paths:  RunPaths,
    limits: DataLimits,
}

impl TrainUseCase {
    pub fn new(cfg: TrainConfig, paths: RunPaths, limits: DataLimits) -> Self {
        Self { cfg, paths, limits }
    }

    pub fn execute(&self) -> Result<TrialMetrics> {
        self.cfg.validate()?;

        let corpus = Corpus::open(&self.paths, self.cfg.model.embedding_size)?;
        let train  = corpus.split("train", self.limits.num_train)?;
        let eval   = corpus.split(self.limits.eval_split.as_str(), self.limits.num_eval)?;

        let dirs = TrialDirs {
            train_dir:   self.paths.train_dir.clone(),
            resume_from: Some(self.paths.resume_dir().clone()),
            log_dir:     self.paths.log_dir.clone(),
        };

        let device = <TrainBackend as Backend>::Device::default();
        tracing::info!("Using device: {:?}", device);
        run_trial::<TrainBackend>(&self.cfg, &corpus, train, eval, &dirs, &device)
    }
}
