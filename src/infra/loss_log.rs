// ============================================================
// Layer 6 — Loss Log
// ============================================================
// Persists a LossHistory as one JSON object per training mode.
// The file is rewritten in full on every flush and never read
// back by the trainer.
//
// Example output (pretrain losses - srgan.json):
//   {
//     "generator_loss": [0.91, 0.85, 0.82],
//     "content_loss": [0.90, 0.84, 0.81],
//     "tv_loss": [0.01, 0.01, 0.01],
//     "val_psnr": [21.4]
//   }

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::domain::{history::LossHistory, mode::TrainingMode};

pub struct LossLog {
    path: PathBuf,
}

impl LossLog {
    pub fn new(dir: impl Into<PathBuf>, mode: TrainingMode) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create history directory '{}'", dir.display()))?;
        Ok(Self { path: dir.join(mode.history_file()) })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn flush(&self, history: &LossHistory) -> Result<()> {
        let json = serde_json::to_string_pretty(history)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Cannot write loss history '{}'", self.path.display()))?;
        tracing::debug!("Flushed loss history to '{}'", self.path.display());
        Ok(())
    }
}
