// ============================================================
// Layer 4 — Image Folder
// ============================================================
// Recursively collects every image file under a directory.
//
//   images/
//     ├── a.png          ─┐
//     ├── set1/b.jpg      ├─▶ sorted list of paths
//     └── set2/c/d.bmp   ─┘
//
// Paths are sorted so that a seeded shuffle gives the same
// order on every machine. Decoding happens later, one batch at
// a time, so a corrupt file fails the run when it is reached.
//
// Reference: Burn Book §4 (Datasets)

use anyhow::{Context, Result};
use burn::data::dataset::Dataset;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::error::SrganError;

const EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

#[derive(Debug, Clone)]
pub struct ImageFolder {
    files: Vec<PathBuf>,
}

impl ImageFolder {
    /// Scan `root` recursively. Fails if no image file is found.
    pub fn scan(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut files = Vec::new();
        collect_images(&root, &mut files)?;
        files.sort();

        if files.is_empty() {
            return Err(SrganError::EmptyImageDirectory(root.display().to_string()).into());
        }

        tracing::info!("Found {} images under '{}'", files.len(), root.display());
        Ok(Self { files })
    }
}

fn collect_images(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Cannot read image directory '{}'", dir.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            collect_images(&path, out)?;
        } else if is_image(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl Dataset<PathBuf> for ImageFolder {
    fn get(&self, index: usize) -> Option<PathBuf> {
        self.files.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.files.len()
    }
}
