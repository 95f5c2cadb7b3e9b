// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights with Burn's
// NamedMpkFileRecorder at full precision, so a restored model
// evaluates exactly like the one that was saved.
//
// File layout of a checkpoint directory:
//
//   train_dir/
//     model_iter_500.mpk     ← weights after iteration 500
//     model_iter_1000.mpk    ← weights after iteration 1000
//     latest.json            ← { "iteration": 1000, "retained": [500, 1000] }
//     train_config.json      ← architecture + hyperparameters
//
// latest.json is the only way a checkpoint is found: it is
// written to a temporary file and renamed into place after the
// weights are on disk, so it never names a partial file.
//
// Retention: with keep = N > 0 only the N newest weight files
// survive; keep = 0 keeps every checkpoint.
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::config::TrainConfig;
use crate::ml::model::NliModel;

type CheckpointRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

const LATEST_FILE: &str = "latest.json";
const CONFIG_FILE: &str = "train_config.json";

/// Contents of latest.json
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestPointer {
    pub iteration: usize,
    /// Iterations whose weight files still exist, oldest first
    pub retained:  Vec<usize>,
}

/// Manages saving and loading of model checkpoints in one directory.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir:  PathBuf,
    keep: usize,
}

impl CheckpointManager {
    /// The directory is created on the first save, not here, so a
    /// manager pointed at a missing directory can still answer
    /// "nothing to resume".
    pub fn new(dir: impl Into<PathBuf>, keep: usize) -> Self {
        Self { dir: dir.into(), keep }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn weights_path(&self, iteration: usize) -> PathBuf {
        // Recorder appends ".mpk"
        self.dir.join(format!("model_iter_{iteration}"))
    }

    /// Save weights for `iteration`, update latest.json, prune old files.
    pub fn save_model<B: Backend>(&self, model: &NliModel<B>, iteration: usize) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", self.dir.display()))?;

        let path = self.weights_path(iteration);
        CheckpointRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let mut pointer = self.read_pointer()?.unwrap_or_default();
        if pointer.retained.last() != Some(&iteration) {
            pointer.retained.retain(|&it| it != iteration);
            pointer.retained.push(iteration);
        }
        pointer.iteration = iteration;

        let mut pruned = Vec::new();
        if self.keep > 0 && pointer.retained.len() > self.keep {
            let excess = pointer.retained.len() - self.keep;
            pruned = pointer.retained.drain(..excess).collect();
        }

        write_atomic(&self.dir.join(LATEST_FILE), &serde_json::to_string_pretty(&pointer)?)?;

        for old in pruned {
            let old_path = self.weights_path(old).with_extension("mpk");
            if let Err(e) = fs::remove_file(&old_path) {
                tracing::warn!("Could not remove old checkpoint '{}': {}", old_path.display(), e);
            }
        }

        tracing::debug!("Saved checkpoint: iteration {} in '{}'", iteration, self.dir.display());
        Ok(())
    }

    /// Restore the newest checkpoint into `model`.
    /// Returns `None` when the directory holds no checkpoint yet.
    pub fn load_latest<B: Backend>(
        &self,
        model:  NliModel<B>,
        device: &B::Device,
    ) -> Result<Option<(NliModel<B>, usize)>> {
        let Some(pointer) = self.read_pointer()? else {
            return Ok(None);
        };
        let path = self.weights_path(pointer.iteration);

        tracing::info!("Restoring checkpoint from iteration {} ('{}')", pointer.iteration, self.dir.display());

        let record = CheckpointRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;

        Ok(Some((model.load_record(record), pointer.iteration)))
    }

    #[cfg(test)]
    pub fn latest_iteration(&self) -> Result<Option<usize>> {
        Ok(self.read_pointer()?.map(|p| p.iteration))
    }

    fn read_pointer(&self) -> Result<Option<LatestPointer>> {
        let path = self.dir.join(LATEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        let pointer = serde_json::from_str(&text)
            .with_context(|| format!("Corrupt checkpoint pointer '{}'", path.display()))?;
        Ok(Some(pointer))
    }

    /// Save the configuration the weights were trained with, so the
    /// model can be rebuilt before its weights are loaded.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", self.dir.display()))?;
        let path = self.dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path).with_context(|| {
            format!("Cannot read config from '{}'. Has this directory been trained?", path.display())
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Write `contents` next to `path` and rename it into place.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents).with_context(|| format!("Cannot write '{}'", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Cannot move '{}' into place", path.display()))?;
    Ok(())
}
