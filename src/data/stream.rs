// ============================================================
// Layer 4 — Batch Stream
// ============================================================
// Endless stream of batches over an image folder.
//
//   pass 1:  shuffle → [3 0 4 | 1 2 5 | 6]   ← last batch may be short
//   pass 2:  shuffle → [5 1 6 | 0 4 2 | 3]
//   ...
//
// The order is reshuffled with a seeded StdRng at the start of
// every pass, so a given seed replays the same sequence. The
// orchestrator decides when to stop pulling.
//
// Reference: rand crate documentation (SeedableRng, SliceRandom)

use anyhow::Result;
use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    prelude::*,
};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::{
    batcher::{SrBatch, SrBatcher},
    degrade::{load_pair, PairDims},
    image_folder::ImageFolder,
};

/// Index order for an endlessly cycling, reshuffled dataset.
#[derive(Debug)]
pub struct CyclingSampler {
    len:        usize,
    batch_size: usize,
    order:      Vec<usize>,
    cursor:     usize,
    passes:     usize,
    rng:        StdRng,
}

impl CyclingSampler {
    pub fn new(len: usize, batch_size: usize, seed: u64) -> Self {
        Self {
            len,
            batch_size: batch_size.max(1),
            order: Vec::new(),
            cursor: 0,
            passes: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Completed or started passes over the dataset.
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Indices of the next batch. Empty only when the dataset is.
    pub fn next_indices(&mut self) -> Vec<usize> {
        if self.len == 0 {
            return Vec::new();
        }
        if self.cursor >= self.order.len() {
            self.order = (0..self.len).collect();
            self.order.shuffle(&mut self.rng);
            self.cursor = 0;
            self.passes += 1;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let batch = self.order[self.cursor..end].to_vec();
        self.cursor = end;
        batch
    }
}

pub struct BatchStream<B: Backend> {
    folder:  ImageFolder,
    batcher: SrBatcher<B>,
    sampler: CyclingSampler,
}

impl<B: Backend> BatchStream<B> {
    pub fn new(folder: ImageFolder, dims: PairDims, batch_size: usize, seed: u64, device: B::Device) -> Self {
        let sampler = CyclingSampler::new(folder.len(), batch_size, seed);
        Self { folder, batcher: SrBatcher::new(device, dims), sampler }
    }

    pub fn dataset_len(&self) -> usize {
        self.folder.len()
    }

    pub fn passes(&self) -> usize {
        self.sampler.passes()
    }

    /// Decode, degrade and stack the next batch. Blocks for the file I/O.
    pub fn next_batch(&mut self) -> Result<SrBatch<B>> {
        let dims = self.batcher.dims;
        let samples = self
            .sampler
            .next_indices()
            .into_iter()
            .filter_map(|i| self.folder.get(i))
            .map(|path| load_pair(&path, dims))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.batcher.batch(samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_each_pass_covers_every_index_once() {
        let mut s = CyclingSampler::new(7, 3, 42);
        for _ in 0..3 {
            let mut seen = HashSet::new();
            let sizes: Vec<usize> = (0..3)
                .map(|_| {
                    let b = s.next_indices();
                    seen.extend(b.iter().copied());
                    b.len()
                })
                .collect();
            assert_eq!(sizes, vec![3, 3, 1]);
            assert_eq!(seen, (0..7).collect());
        }
        assert_eq!(s.passes(), 3);
    }

    #[test]
    fn test_same_seed_same_order() {
        let mut a = CyclingSampler::new(20, 4, 7);
        let mut b = CyclingSampler::new(20, 4, 7);
        for _ in 0..12 {
            assert_eq!(a.next_indices(), b.next_indices());
        }
    }

    #[test]
    fn test_passes_are_reshuffled() {
        let mut s = CyclingSampler::new(32, 32, 1);
        let first = s.next_indices();
        let second = s.next_indices();
        assert_ne!(first, second);
    }

    #[test]
    fn test_empty_dataset_yields_nothing() {
        let mut s = CyclingSampler::new(0, 4, 0);
        assert!(s.next_indices().is_empty());
    }
}
