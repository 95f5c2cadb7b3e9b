// ============================================================
// Layer 2 — SearchUseCase
// ============================================================
// Exhaustive grid search over (lr, keep probability, L2):
//
//   for l2 in l2s            (outermost)
//     for keep in keeps
//       for lr in lrs        (innermost)
//         fresh model → train → evaluate → record → flush table
//
// Every grid point gets its own checkpoint and log directory and
// never resumes. Points already present in the results table are
// skipped, so rerunning an interrupted search picks up where it
// stopped. A point that fails (error or panic) is logged and the
// search moves on; it is not recorded, so the next run retries it.
//
// Reference: Bergstra & Bengio (2012) Random Search for
//            Hyper-Parameter Optimization (grid baseline)

use anyhow::{Context, Result};
use burn::prelude::*;
use std::{
    any::Any,
    fs,
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
};

use crate::application::{
    config::{ConfigError, DataLimits, RunPaths, TrainConfig},
    train_use_case::{run_trial, Corpus, TrialDirs},
};
use crate::infra::results_store::{GridResults, TrialKey, TrialMetrics, TrialRecord};
use crate::ml::TrainBackend;

// ─── Grid ────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct SearchGrid {
    pub lrs:   Vec<f64>,
    pub keeps: Vec<f64>,
    pub l2s:   Vec<f64>,
}

impl Default for SearchGrid {
    fn default() -> Self {
        Self {
            lrs:   vec![1e-8, 1e-7, 1e-6, 1e-5, 1e-4, 1e-3, 1e-2],
            keeps: vec![0.5, 0.6, 0.7, 0.8, 0.9, 1.0],
            l2s:   vec![1e-4, 1e-3, 1e-2, 1e-1, 1.0],
        }
    }
}

impl SearchGrid {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lrs.is_empty() {
            return Err(ConfigError::EmptyGrid("lr"));
        }
        if self.keeps.is_empty() {
            return Err(ConfigError::EmptyGrid("keep"));
        }
        if self.l2s.is_empty() {
            return Err(ConfigError::EmptyGrid("l2"));
        }
        Ok(())
    }

    /// All grid points, l2 outermost and lr innermost.
    pub fn points(&self) -> Vec<TrialKey> {
        let mut points = Vec::with_capacity(self.len());
        for &l2 in &self.l2s {
            for &keep in &self.keeps {
                for &lr in &self.lrs {
                    points.push(TrialKey { lr, keep, l2 });
                }
            }
        }
        points
    }

    pub fn len(&self) -> usize {
        self.lrs.len() * self.keeps.len() * self.l2s.len()
    }
}

/// Directory name for one grid point.
pub fn trial_dir_name(key: &TrialKey) -> String {
    format!("lr_{:e}_keep_{}_l2_{:e}", key.lr, key.keep, key.l2)
}

// ─── SearchUseCase ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSummary {
    pub completed: usize,
    pub skipped:   usize,
    pub failed:    usize,
    /// Highest evaluation accuracy in the table after the search
    pub best:      Option<TrialRecord>,
}

pub struct SearchUseCase {
    base:         TrainConfig,
    paths:        RunPaths,
    limits:       DataLimits,
    grid:         SearchGrid,
    results_path: PathBuf,
}

impl SearchUseCase {
    pub fn new(
        base:         TrainConfig,
        paths:        RunPaths,
        limits:       DataLimits,
        grid:         SearchGrid,
        results_path: PathBuf,
    ) -> Self {
        Self { base, paths, limits, grid, results_path }
    }

    pub fn execute(&self) -> Result<SearchSummary> {
        // Every grid point must be a valid configuration before any work starts.
        self.grid.validate()?;
        let points = self.grid.points();
        for key in &points {
            self.base.with_trial(key.lr, key.keep, key.l2).validate()?;
        }

        let corpus = Corpus::open(&self.paths, self.base.model.embedding_size)?;
        let train  = corpus.split("train", self.limits.num_train)?;
        let eval   = corpus.split(self.limits.eval_split.as_str(), self.limits.num_eval)?;

        let mut results = GridResults::load(&self.results_path)?;
        let device = <TrainBackend as Backend>::Device::default();

        tracing::info!(
            "Grid search over {} points, {} already recorded in '{}'",
            points.len(),
            results.len(),
            results.path().display()
        );

        self.run_points(&points, &mut results, |cfg, dirs| {
            run_trial::<TrainBackend>(cfg, &corpus, train.clone(), eval.clone(), dirs, &device)
        })
    }

    /// Run every point not yet in `results` through `trial`, isolating
    /// errors and panics, and flush the table after each success.
    fn run_points<F>(&self, points: &[TrialKey], results: &mut GridResults, mut trial: F) -> Result<SearchSummary>
    where
        F: FnMut(&TrainConfig, &TrialDirs) -> Result<TrialMetrics>,
    {
        let mut summary = SearchSummary::default();

        for (i, key) in points.iter().enumerate() {
            if results.contains(key) {
                tracing::info!("[{}/{}] {} already recorded, skipping", i + 1, points.len(), key);
                summary.skipped += 1;
                continue;
            }
            tracing::info!("[{}/{}] {}", i + 1, points.len(), key);

            let cfg  = self.base.with_trial(key.lr, key.keep, key.l2);
            let name = trial_dir_name(key);
            let dirs = TrialDirs {
                train_dir:   self.paths.train_dir.join(&name),
                resume_from: None,
                log_dir:     self.paths.log_dir.join(&name),
            };
            // Leftovers of an earlier failed attempt must not leak into this one.
            clear_trial_dirs(&dirs)?;

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| trial(&cfg, &dirs)));

            match outcome {
                Ok(Ok(metrics)) => {
                    results.upsert(*key, metrics);
                    results.save()?;
                    summary.completed += 1;
                    log_running_best(results);
                }
                Ok(Err(e)) => {
                    tracing::warn!("Trial {} failed: {:#}", key, e);
                    summary.failed += 1;
                }
                Err(payload) => {
                    tracing::warn!("Trial {} panicked: {}", key, panic_message(payload.as_ref()));
                    summary.failed += 1;
                }
            }
        }

        summary.best = results.best_by_eval().cloned();
        Ok(summary)
    }
}

fn clear_trial_dirs(dirs: &TrialDirs) -> Result<()> {
    for dir in [&dirs.train_dir, &dirs.log_dir] {
        if dir.exists() {
            fs::remove_dir_all(dir).with_context(|| format!("Cannot clear trial directory '{}'", dir.display()))?;
        }
    }
    Ok(())
}

fn log_running_best(results: &GridResults) {
    let by = |f: fn(&TrialRecord) -> f64| {
        results
            .records()
            .iter()
            .max_by(|a, b| f(a).total_cmp(&f(b)))
            .map(|r| (f(r), r.key))
    };
    if let (Some((train_acc, train_key)), Some((eval_acc, eval_key))) = (
        by(|r| r.metrics.train_accuracy),
        by(|r| r.metrics.eval_accuracy),
    ) {
        tracing::info!(
            "Best so far: train_acc {:.2}% ({}) | eval_acc {:.2}% ({})",
            train_acc * 100.0,
            train_key,
            eval_acc * 100.0,
            eval_key,
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
