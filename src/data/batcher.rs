// ============================================================
// Layer 4 — SR Batcher
// ============================================================
// Implements Burn's Batcher trait to stack training pairs into
// image tensors.
//
//   Input:  Vec of N SrSamples, each planar CHW
//   Output: SrBatch { high_res: [N, 3, H, W], low_res: [N, 3, h, w] }
//
// Samples are already planar, so stacking is a flat concat and a
// reshape. Values stay in [0, 1]; the orchestrator rescales the
// ground truth to pixel range where a network expects it.
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*, tensor::TensorData};

use crate::data::degrade::{PairDims, SrSample};

#[derive(Debug, Clone)]
pub struct SrBatch<B: Backend> {
    /// Ground truth — shape: [batch, 3, H, W], range [0, 1]
    pub high_res: Tensor<B, 4>,
    /// Generator input — shape: [batch, 3, h, w], range [0, 1]
    pub low_res:  Tensor<B, 4>,
}

impl<B: Backend> SrBatch<B> {
    pub fn len(&self) -> usize {
        self.high_res.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug)]
pub struct SrBatcher<B: Backend> {
    pub device: B::Device,
    pub dims:   PairDims,
}

impl<B: Backend> SrBatcher<B> {
    pub fn new(device: B::Device, dims: PairDims) -> Self {
        Self { device, dims }
    }
}

impl<B: Backend> Batcher<SrSample, SrBatch<B>> for SrBatcher<B> {
    fn batch(&self, items: Vec<SrSample>) -> SrBatch<B> {
        let n = items.len();
        let d = self.dims;

        let mut high = Vec::with_capacity(n * d.high_len());
        let mut low  = Vec::with_capacity(n * d.low_len());
        for item in items {
            high.extend(item.high_res);
            low.extend(item.low_res);
        }

        let high_res = Tensor::from_data(
            TensorData::new(high, [n, 3, d.high_height as usize, d.high_width as usize]),
            &self.device,
        );
        let low_res = Tensor::from_data(
            TensorData::new(low, [n, 3, d.low_height as usize, d.low_width as usize]),
            &self.device,
        );
        SrBatch { high_res, low_res }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_batch_shapes_and_order() {
        let dims = PairDims { high_width: 4, high_height: 2, low_width: 2, low_height: 1 };
        let sample = |v: f32| SrSample {
            high_res: vec![v; dims.high_len()],
            low_res:  vec![v; dims.low_len()],
        };
        let batcher = SrBatcher::<TestBackend>::new(Default::default(), dims);
        let batch = batcher.batch(vec![sample(0.25), sample(0.75)]);

        assert_eq!(batch.high_res.dims(), [2, 3, 2, 4]);
        assert_eq!(batch.low_res.dims(), [2, 3, 1, 2]);
        assert_eq!(batch.len(), 2);

        let low = batch.low_res.into_data().to_vec::<f32>().unwrap();
        assert!(low[..6].iter().all(|v| *v == 0.25));
        assert!(low[6..].iter().all(|v| *v == 0.75));
    }
}
