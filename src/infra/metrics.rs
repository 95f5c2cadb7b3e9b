// ============================================================
// Layer 6 — Run Log
// ============================================================
// Per-run files in the log directory:
//
//   log_dir/run_config.json   ← resolved TrainConfig for this run
//   log_dir/metrics.csv       ← one row per finished epoch
//
// Example CSV output:
//   epoch,iteration,train_loss,train_acc
//   1,157,1.034512,0.451200
//   2,314,0.912877,0.563300
//
// The CSV is appended to, so a resumed run continues the same
// learning curve.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::application::config::TrainConfig;

/// One row of metrics for a single training epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    /// Global iteration count when the epoch ended
    pub iteration:  usize,
    /// Mean cross-entropy per training example (L2 term excluded)
    pub train_loss: f64,
    pub train_acc:  f64,
}

/// Writes run_config.json and metrics.csv into one directory.
pub struct MetricsLogger {
    dir:      PathBuf,
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the directory and the CSV header if they don't exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create log directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,iteration,train_loss,train_acc")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { dir, csv_path })
    }

    pub fn log_run_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("run_config.json");
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        Ok(())
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(f, "{},{},{:.6},{:.6}", m.epoch, m.iteration, m.train_loss, m.train_acc)?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, train_acc={:.4}",
            m.epoch,
            m.train_loss,
            m.train_acc,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
