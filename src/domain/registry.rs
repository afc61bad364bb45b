// ============================================================
// Layer 3 — Layer Registry
// ============================================================
// Every subnetwork publishes an ordered list of its weighted
// layers: a prefixed name plus the shape of every parameter.
//
//   sr_res_conv1   [[64, 3, 5, 5], [64]]
//   sr_res_bn_1    [[64], [64]]
//   ...
//
// The registry is written next to each weight archive as a
// manifest. Before a load assigns anything, the manifest is
// compared with the live network so a misaligned archive fails
// fast instead of silently landing in the wrong layers.

use serde::{Deserialize, Serialize};

use crate::domain::error::SrganError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerEntry {
    pub name:   String,
    pub shapes: Vec<Vec<usize>>,
}

impl LayerEntry {
    pub fn new(name: impl Into<String>, shapes: Vec<Vec<usize>>) -> Self {
        Self { name: name.into(), shapes }
    }

    pub fn param_count(&self) -> usize {
        self.shapes.iter().map(|s| s.iter().product::<usize>()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRegistry {
    layers: Vec<LayerEntry>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LayerEntry) {
        self.layers.push(entry);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[LayerEntry] {
        &self.layers
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|l| l.name.as_str())
    }

    pub fn param_count(&self) -> usize {
        self.layers.iter().map(LayerEntry::param_count).sum()
    }

    /// True when every layer name starts with `prefix`.
    pub fn all_prefixed(&self, prefix: &str) -> bool {
        self.layers.iter().all(|l| l.name.starts_with(prefix))
    }

    /// Check that `archived` describes exactly this network.
    ///
    /// Count is checked first, then names in order, then shapes.
    pub fn verify_archive(
        &self,
        archived: &LayerRegistry,
        network:  &'static str,
        archive:  &str,
    ) -> Result<(), SrganError> {
        if archived.len() != self.len() {
            return Err(SrganError::LayerCountMismatch {
                archive:  archive.to_string(),
                network,
                expected: self.len(),
                found:    archived.len(),
            });
        }

        for (index, (live, saved)) in self.layers.iter().zip(&archived.layers).enumerate() {
            if live.name != saved.name {
                return Err(SrganError::LayerNameMismatch {
                    archive:  archive.to_string(),
                    index,
                    expected: live.name.clone(),
                    found:    saved.name.clone(),
                });
            }
            if live.shapes != saved.shapes {
                return Err(SrganError::LayerShapeMismatch {
                    archive:  archive.to_string(),
                    layer:    live.name.clone(),
                    expected: live.shapes.clone(),
                    found:    saved.shapes.clone(),
                });
            }
        }
        Ok(())
    }
}
