// ============================================================
// Layer 6 — Grid Search Results Store
// ============================================================
// Persistent table of finished trials, keyed by the exact
// (lr, keep, l2) triple:
//
//   [
//     { "lr": 0.001, "keep": 0.8, "l2": 0.01,
//       "metrics": { "train_accuracy": 0.61, "eval_accuracy": 0.58, ... } },
//     ...
//   ]
//
// The whole table is rewritten after every trial through a
// temporary file + rename, so an interrupted search leaves either
// the previous table or the new one, never half of one. On start
// the table is reloaded and finished triples are skipped.
//
// Reference: Rust Book §8 (Collections), serde_json documentation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::confusion::ConfusionMatrix;
use crate::infra::checkpoint::write_atomic;

/// One grid point. Equality is bitwise on the floats, so a key
/// only matches the exact value it was recorded with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrialKey {
    pub lr:   f64,
    pub keep: f64,
    pub l2:   f64,
}

impl PartialEq for TrialKey {
    fn eq(&self, other: &Self) -> bool {
        self.lr.to_bits() == other.lr.to_bits()
            && self.keep.to_bits() == other.keep.to_bits()
            && self.l2.to_bits() == other.l2.to_bits()
    }
}

impl std::fmt::Display for TrialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lr={:e} keep={} l2={:e}", self.lr, self.keep, self.l2)
    }
}

/// Outcome of one training + evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialMetrics {
    pub epochs_run:     usize,
    pub iterations:     usize,
    pub train_accuracy: f64,
    pub train_loss:     f64,
    pub eval_accuracy:  f64,
    pub eval_loss:      f64,
    pub confusion:      ConfusionMatrix,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    #[serde(flatten)]
    pub key:     TrialKey,
    pub metrics: TrialMetrics,
}

pub struct GridResults {
    path:    PathBuf,
    records: Vec<TrialRecord>,
}

impl GridResults {
    /// Load the table at `path`; a missing file is an empty table.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("Cannot read results '{}'", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Corrupt results file '{}'", path.display()))?
        } else {
            Vec::new()
        };
        tracing::info!("Results table '{}' holds {} finished trials", path.display(), records.len());
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn get(&self, key: &TrialKey) -> Option<&TrialMetrics> {
        self.records.iter().find(|r| r.key == *key).map(|r| &r.metrics)
    }

    pub fn contains(&self, key: &TrialKey) -> bool {
        self.get(key).is_some()
    }

    pub fn upsert(&mut self, key: TrialKey, metrics: TrialMetrics) {
        match self.records.iter_mut().find(|r| r.key == key) {
            Some(existing) => existing.metrics = metrics,
            None => self.records.push(TrialRecord { key, metrics }),
        }
    }

    /// Rewrite the whole table atomically.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }
        write_atomic(&self.path, &serde_json::to_string_pretty(&self.records)?)
    }

    /// Record with the highest evaluation accuracy (first one wins ties).
    pub fn best_by_eval(&self) -> Option<&TrialRecord> {
        self.records.iter().fold(None, |best: Option<&TrialRecord>, r| match best {
            Some(b) if b.metrics.eval_accuracy >= r.metrics.eval_accuracy => Some(b),
            _ => Some(r),
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn metrics(eval_accuracy: f64) -> TrialMetrics {
        TrialMetrics {
            epochs_run: 1,
            iterations: 3,
            train_accuracy: 0.5,
            train_loss: 1.0,
            eval_accuracy,
            eval_loss: 1.1,
            confusion: ConfusionMatrix::new(),
        }
    }

    fn key(lr: f64) -> TrialKey {
        TrialKey { lr, keep: 0.8, l2: 0.01 }
    }

    #[test]
    fn test_missing_file_is_empty_table() {
        let tmp = TempDir::new().unwrap();
        let results = GridResults::load(tmp.path().join("grid.json")).unwrap();
        assert!(results.records().is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("hyper").join("grid.json");

        let mut results = GridResults::load(&path).unwrap();
        results.upsert(key(1e-3), metrics(0.4));
        results.upsert(key(1e-2), metrics(0.6));
        results.save().unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let reloaded = GridResults::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains(&key(1e-3)));
        assert!(!reloaded.contains(&key(1e-4)));
        assert_eq!(reloaded.get(&key(1e-2)).unwrap().eval_accuracy, 0.6);
    }

    #[test]
    fn test_upsert_replaces_existing_triple() {
        let tmp = TempDir::new().unwrap();
        let mut results = GridResults::load(tmp.path().join("g.json")).unwrap();
        results.upsert(key(1e-3), metrics(0.4));
        results.upsert(key(1e-3), metrics(0.7));
        assert_eq!(results.len(), 1);
        assert_eq!(results.get(&key(1e-3)).unwrap().eval_accuracy, 0.7);
    }

    #[test]
    fn test_best_by_eval() {
        let tmp = TempDir::new().unwrap();
        let mut results = GridResults::load(tmp.path().join("g.json")).unwrap();
        assert!(results.best_by_eval().is_none());
        results.upsert(key(1e-3), metrics(0.4));
        results.upsert(key(1e-2), metrics(0.6));
        results.upsert(key(1e-1), metrics(0.6));
        assert_eq!(results.best_by_eval().unwrap().key, key(1e-2));
    }
}
