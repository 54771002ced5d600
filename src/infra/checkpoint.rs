// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Owns the model output directory.
//
// File layout:
//   RobertaMLM/
//     train_config.json      ← hyperparameters of this run
//     checkpoint-8192.mpk    ← weights after step 8192
//     checkpoint-16384.mpk   ← ...only the newest `save_total_limit` kept
//     model.mpk              ← final weights
//     metrics.csv            ← written by MetricsLogger
//     tokenizer.json         ← copied by TokenizerStore
//
// Weights go through Burn's CompactRecorder (named MessagePack,
// half precision). The recorder picks the file extension.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{anyhow, bail, Context, Result};
use burn::{prelude::*, record::CompactRecorder};
use std::{fs, path::{Path, PathBuf}};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::MaskedLm;

const STEP_PREFIX: &str = "checkpoint-";
const FINAL_MODEL: &str = "model";
const CONFIG_FILE: &str = "train_config.json";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Open (creating if needed) the model directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create model directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Like `new`, but refuse a non-empty directory unless `overwrite` is set.
    pub fn prepare(dir: impl Into<PathBuf>, overwrite: bool) -> Result<Self> {
        let dir = dir.into();
        if !overwrite && dir.is_dir() && fs::read_dir(&dir)?.next().is_some() {
            bail!(
                "Model directory '{}' already exists and is not empty; \
                 run with --overwrite-output-dir true to reuse it",
                dir.display()
            );
        }
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the run configuration as pretty JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Save a step checkpoint, then drop the oldest ones so that at
    /// most `limit` remain. A limit of 0 keeps every checkpoint.
    pub fn save_step<B: Backend>(&self, model: &MaskedLm<B>, step: usize, limit: usize) -> Result<()> {
        let path = self.dir.join(format!("{STEP_PREFIX}{step}"));
        model
            .clone()
            .save_file(path.clone(), &CompactRecorder::new())
            .map_err(|e| anyhow!("Failed to save checkpoint '{}': {e:?}", path.display()))?;
        tracing::info!("Saved checkpoint at step {}", step);

        if limit > 0 {
            let steps = self.step_checkpoints()?;
            let excess = steps.len().saturating_sub(limit);
            for old in &steps[..excess] {
                self.remove_step(*old)?;
            }
        }
        Ok(())
    }

    /// Save the trained model.
    pub fn save_final<B: Backend>(&self, model: &MaskedLm<B>) -> Result<()> {
        let path = self.dir.join(FINAL_MODEL);
        model
            .clone()
            .save_file(path.clone(), &CompactRecorder::new())
            .map_err(|e| anyhow!("Failed to save model to '{}': {e:?}", path.display()))?;
        tracing::info!("Saved model to '{}'", self.dir.display());
        Ok(())
    }

    /// Steps with a checkpoint on disk, ascending.
    pub fn step_checkpoints(&self) -> Result<Vec<usize>> {
        let mut steps: Vec<usize> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| checkpoint_step(&entry.file_name().to_string_lossy()))
            .collect();
        steps.sort_unstable();
        steps.dedup();
        Ok(steps)
    }

    fn remove_step(&self, step: usize) -> Result<()> {
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if checkpoint_step(&entry.file_name().to_string_lossy()) == Some(step) {
                fs::remove_file(entry.path())
                    .with_context(|| format!("Cannot remove '{}'", entry.path().display()))?;
            }
        }
        tracing::debug!("Removed checkpoint for step {}", step);
        Ok(())
    }
}

/// "checkpoint-8192.mpk" → Some(8192)
fn checkpoint_step(file_name: &str) -> Option<usize> {
    let rest   = file_name.strip_prefix(STEP_PREFIX)?;
    let digits = rest.split('.').next()?;
    digits.parse().ok()
}
