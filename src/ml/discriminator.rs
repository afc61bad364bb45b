use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig, Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::{leaky_relu, sigmoid},
};

use crate::domain::registry::LayerRegistry;
use crate::ml::registry::{collect, conv_entry, dense_entry, norm_entry, WeightRegistry};

const SLOPE: f64 = 0.3;

#[derive(Config, Debug)]
pub struct DiscriminatorConfig {
    /// High-resolution input height.
    pub height: usize,
    /// High-resolution input width.
    pub width:  usize,
    /// Filters [128, 256] and a 128-unit dense layer instead of [128, 256, 512] and 1024.
    #[config(default = false)]
    pub small:  bool,
}

impl DiscriminatorConfig {
    pub fn filters(&self) -> &'static [usize] {
        if self.small { &[128, 256] } else { &[128, 256, 512] }
    }

    pub fn dense_units(&self) -> usize {
        if self.small { 128 } else { 1024 }
    }

    /// Spatial size left after every stride-2 convolution.
    pub fn feature_dims(&self) -> [usize; 2] {
        let halvings = 1 + self.filters().len();
        let shrink = |mut d: usize| {
            for _ in 0..halvings {
                d = d.div_ceil(2);
            }
            d
        };
        [shrink(self.height), shrink(self.width)]
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Discriminator<B> {
        let conv1_1 = conv(3, 64, 1, device);
        let conv1_2 = conv(64, 64, 2, device);
        let bn1_1   = BatchNormConfig::new(64).init(device);

        let mut stages = Vec::new();
        let mut input = 64;
        for &filters in self.filters() {
            stages.push(DiscStage {
                conv_1: conv(input, filters, 1, device),
                bn_1:   BatchNormConfig::new(filters).init(device),
                conv_2: conv(filters, filters, 2, device),
                bn_2:   BatchNormConfig::new(filters).init(device),
            });
            input = filters;
        }

        let [h, w] = self.feature_dims();
        let dense1 = LinearConfig::new(input * h * w, self.dense_units()).init(device);
        let output = LinearConfig::new(self.dense_units(), 1).init(device);

        Discriminator { conv1_1, conv1_2, bn1_1, stages, dense1, output }
    }
}

fn conv<B: Backend>(input: usize, output: usize, stride: usize, device: &B::Device) -> Conv2d<B> {
    Conv2dConfig::new([input, output], [3, 3])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .init(device)
}

/// Two 3×3 convolutions, stride 1 then stride 2, each followed by lrelu and BN.
#[derive(Module, Debug)]
pub struct DiscStage<B: Backend> {
    pub conv_1: Conv2d<B>,
    pub bn_1:   BatchNorm<B, 2>,
    pub conv_2: Conv2d<B>,
    pub bn_2:   BatchNorm<B, 2>,
}

impl<B: Backend> DiscStage<B> {
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.bn_1.forward(leaky_relu(self.conv_1.forward(input), SLOPE));
        self.bn_2.forward(leaky_relu(self.conv_2.forward(x), SLOPE))
    }
}

#[derive(Module, Debug)]
pub struct Discriminator<B: Backend> {
    pub conv1_1: Conv2d<B>,
    pub conv1_2: Conv2d<B>,
    pub bn1_1:   BatchNorm<B, 2>,
    pub stages:  Vec<DiscStage<B>>,
    pub dense1:  Linear<B>,
    pub output:  Linear<B>,
}

impl<B: Backend> Discriminator<B> {
    /// images: [batch, 3, H, W] in [0, 255] → probability of "real": [batch, 1]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        sigmoid(self.forward_logits(images))
    }

    /// Pre-sigmoid output of `gan_output`: [batch, 1]
    pub fn forward_logits(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = images / 255.0;
        let x = leaky_relu(self.conv1_1.forward(x), SLOPE);
        let mut x = self.bn1_1.forward(leaky_relu(self.conv1_2.forward(x), SLOPE));

        for stage in &self.stages {
            x = stage.forward(x);
        }

        let x: Tensor<B, 2> = x.flatten(1, 3);
        let x = leaky_relu(self.dense1.forward(x), SLOPE);
        self.output.forward(x)
    }
}

impl<B: Backend> WeightRegistry for Discriminator<B> {
    const PREFIX:  &'static str = "gan_";
    const NETWORK: &'static str = "discriminator";

    fn registry(&self) -> LayerRegistry {
        let mut entries = vec![
            conv_entry("gan_conv1_1", &self.conv1_1),
            conv_entry("gan_conv1_2", &self.conv1_2),
            norm_entry("gan_batchnorm1_1", &self.bn1_1),
        ];
        for (i, stage) in self.stages.iter().enumerate() {
            let id = i + 2;
            entries.push(conv_entry(format!("gan_conv{id}_1"), &stage.conv_1));
            entries.push(norm_entry(format!("gan_batchnorm{id}_1"), &stage.bn_1));
            entries.push(conv_entry(format!("gan_conv{id}_2"), &stage.conv_2));
            entries.push(norm_entry(format!("gan_batchnorm{id}_2"), &stage.bn_2));
        }
        entries.push(dense_entry("gan_dense1", &self.dense1));
        entries.push(dense_entry("gan_output", &self.output));
        collect(entries)
    }
}
