use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::MaxPool2dConfig,
        PaddingConfig2d,
    },
    prelude::*,
    tensor::{activation::relu, TensorData},
};
use serde::{Deserialize, Serialize};

use crate::domain::registry::LayerRegistry;
use crate::ml::registry::{collect, conv_entry, WeightRegistry};

/// ImageNet channel statistics the pretrained weights expect.
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD:  [f32; 3] = [0.229, 0.224, 0.225];

/// Activation the perceptual loss is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureTap {
    /// Shallow features, used while pretraining the generator.
    Conv2_2,
    /// Deep features, used in full adversarial training.
    Conv5_3,
}

/// VGG16 convolutional trunk, frozen after loading.
#[derive(Module, Debug)]
pub struct FeatureExtractor<B: Backend> {
    pub conv1_1: Conv2d<B>,
    pub conv1_2: Conv2d<B>,
    pub conv2_1: Conv2d<B>,
    pub conv2_2: Conv2d<B>,
    pub conv3_1: Conv2d<B>,
    pub conv3_2: Conv2d<B>,
    pub conv3_3: Conv2d<B>,
    pub conv4_1: Conv2d<B>,
    pub conv4_2: Conv2d<B>,
    pub conv4_3: Conv2d<B>,
    pub conv5_1: Conv2d<B>,
    pub conv5_2: Conv2d<B>,
    pub conv5_3: Conv2d<B>,
}

impl<B: Backend> FeatureExtractor<B> {
    pub fn new(device: &B::Device) -> Self {
        let conv = |input, output| {
            Conv2dConfig::new([input, output], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device)
        };
        Self {
            conv1_1: conv(3, 64),
            conv1_2: conv(64, 64),
            conv2_1: conv(64, 128),
            conv2_2: conv(128, 128),
            conv3_1: conv(128, 256),
            conv3_2: conv(256, 256),
            conv3_3: conv(256, 256),
            conv4_1: conv(256, 512),
            conv4_2: conv(512, 512),
            conv4_3: conv(512, 512),
            conv5_1: conv(512, 512),
            conv5_2: conv(512, 512),
            conv5_3: conv(512, 512),
        }
    }

    /// Map [0, 255] pixels to the normalised ImageNet distribution.
    pub fn normalize(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        let device = images.device();
        let mean = Tensor::<B, 4>::from_data(TensorData::new(MEAN.to_vec(), [1, 3, 1, 1]), &device);
        let std  = Tensor::<B, 4>::from_data(TensorData::new(STD.to_vec(), [1, 3, 1, 1]), &device);
        (images / 255.0 - mean) / std
    }

    /// images: [batch, 3, H, W] in [0, 255] → activation at `tap`.
    ///
    /// The pass stops at the requested layer.
    pub fn forward_to(&self, images: Tensor<B, 4>, tap: FeatureTap) -> Tensor<B, 4> {
        let x = self.normalize(images);

        let x = relu(self.conv1_1.forward(x));
        let x = relu(self.conv1_2.forward(x));
        let x = pool(x);

        let x = relu(self.conv2_1.forward(x));
        let x = relu(self.conv2_2.forward(x));
        if tap == FeatureTap::Conv2_2 {
            return x;
        }
        let x = pool(x);

        let x = relu(self.conv3_1.forward(x));
        let x = relu(self.conv3_2.forward(x));
        let x = relu(self.conv3_3.forward(x));
        let x = pool(x);

        let x = relu(self.conv4_1.forward(x));
        let x = relu(self.conv4_2.forward(x));
        let x = relu(self.conv4_3.forward(x));
        let x = pool(x);

        let x = relu(self.conv5_1.forward(x));
        let x = relu(self.conv5_2.forward(x));
        relu(self.conv5_3.forward(x))
    }

    fn convs(&self) -> [(&'static str, &Conv2d<B>); 13] {
        [
            ("vgg_conv1_1", &self.conv1_1),
            ("vgg_conv1_2", &self.conv1_2),
            ("vgg_conv2_1", &self.conv2_1),
            ("vgg_conv2_2", &self.conv2_2),
            ("vgg_conv3_1", &self.conv3_1),
            ("vgg_conv3_2", &self.conv3_2),
            ("vgg_conv3_3", &self.conv3_3),
            ("vgg_conv4_1", &self.conv4_1),
            ("vgg_conv4_2", &self.conv4_2),
            ("vgg_conv4_3", &self.conv4_3),
            ("vgg_conv5_1", &self.conv5_1),
            ("vgg_conv5_2", &self.conv5_2),
            ("vgg_conv5_3", &self.conv5_3),
        ]
    }
}

fn pool<B: Backend>(x: Tensor<B, 4>) -> Tensor<B, 4> {
    MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init().forward(x)
}

impl<B: Backend> WeightRegistry for FeatureExtractor<B> {
    const PREFIX:  &'static str = "vgg_";
    const NETWORK: &'static str = "feature extractor";

    fn registry(&self) -> LayerRegistry {
        collect(self.convs().into_iter().map(|(name, conv)| conv_entry(name, conv)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_taps_stop_at_requested_depth() {
        let device = Default::default();
        let vgg = FeatureExtractor::<TestBackend>::new(&device);
        let x = Tensor::<TestBackend, 4>::full([2, 3, 32, 32], 128.0, &device);

        let shallow = vgg.forward_to(x.clone(), FeatureTap::Conv2_2);
        assert_eq!(shallow.dims(), [2, 128, 16, 16]);

        let deep = vgg.forward_to(x, FeatureTap::Conv5_3);
        assert_eq!(deep.dims(), [2, 512, 2, 2]);
    }

    #[test]
    fn test_normalize_uses_imagenet_statistics() {
        let device = Default::default();
        let vgg = FeatureExtractor::<TestBackend>::new(&device);
        let x = Tensor::<TestBackend, 4>::full([1, 3, 1, 1], 255.0, &device);
        let y = vgg.normalize(x).into_data().to_vec::<f32>().unwrap();
        for c in 0..3 {
            let expected = (1.0 - MEAN[c]) / STD[c];
            assert!((y[c] - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn test_registry_has_thirteen_convs() {
        let vgg = FeatureExtractor::<TestBackend>::new(&Default::default());
        let registry = vgg.registry();
        assert_eq!(registry.len(), 13);
        assert!(registry.all_prefixed("vgg_"));
        assert_eq!(registry.layers()[12].shapes, vec![vec![512, 512, 3, 3], vec![512]]);
    }
}
