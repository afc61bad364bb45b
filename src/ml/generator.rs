use burn::{
    module::AutodiffModule,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::{activation::leaky_relu, backend::AutodiffBackend},
};

use crate::domain::registry::LayerRegistry;
use crate::ml::pixel_shuffle::depth_to_space;
use crate::ml::registry::{collect, conv_entry, norm_entry, WeightRegistry};

const SLOPE: f64 = 0.25;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct GeneratorConfig {
    /// Feature maps carried through the residual trunk.
    #[config(default = 64)]
    pub channels:    usize,
    /// Each stage doubles height and width.
    #[config(default = 2)]
    pub nb_upscales: usize,
    /// 5 residual blocks instead of 15.
    #[config(default = false)]
    pub small:       bool,
}

impl GeneratorConfig {
    pub fn residual_blocks(&self) -> usize {
        if self.small { 5 } else { 15 }
    }

    pub fn scale(&self) -> usize {
        1 << self.nb_upscales
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Generator<B> {
        let c = self.channels;
        let conv1 = conv(3, c, 5, device);
        let bn_1  = BatchNormConfig::new(c).init(device);
        let conv2 = conv(c, c, 5, device);
        let bn_2  = BatchNormConfig::new(c).init(device);

        let residual = (0..self.residual_blocks())
            .map(|_| ResidualBlock {
                conv_1: conv(c, c, 3, device),
                bn_1:   BatchNormConfig::new(c).init(device),
                conv_2: conv(c, c, 3, device),
                bn_2:   BatchNormConfig::new(c).init(device),
            })
            .collect();

        let upscale = (0..self.nb_upscales)
            .map(|_| UpscaleBlock {
                upconv: conv(c, 4 * c, 3, device),
                filter: conv(c, c, 3, device),
            })
            .collect();

        let conv_final = conv(c, 3, 5, device);

        Generator { conv1, bn_1, conv2, bn_2, residual, upscale, conv_final }
    }
}

fn conv<B: Backend>(input: usize, output: usize, kernel: usize, device: &B::Device) -> Conv2d<B> {
    let pad = kernel / 2;
    Conv2dConfig::new([input, output], [kernel, kernel])
        .with_padding(PaddingConfig2d::Explicit(pad, pad))
        .init(device)
}

/// conv → BN → lrelu → conv → BN, added to the block input.
#[derive(Module, Debug)]
pub struct ResidualBlock<B: Backend> {
    pub conv_1: Conv2d<B>,
    pub bn_1:   BatchNorm<B, 2>,
    pub conv_2: Conv2d<B>,
    pub bn_2:   BatchNorm<B, 2>,
}

impl<B: Backend> ResidualBlock<B> {
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.bn_1.forward(self.conv_1.forward(input.clone()));
        let x = leaky_relu(x, SLOPE);
        let x = self.bn_2.forward(self.conv_2.forward(x));
        x + input
    }
}

/// conv to 4× channels → lrelu → depth-to-space(2) → smoothing conv → lrelu.
#[derive(Module, Debug)]
pub struct UpscaleBlock<B: Backend> {
    pub upconv: Conv2d<B>,
    pub filter: Conv2d<B>,
}

impl<B: Backend> UpscaleBlock<B> {
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = leaky_relu(self.upconv.forward(input), SLOPE);
        let x = depth_to_space(x, 2);
        leaky_relu(self.filter.forward(x), SLOPE)
    }
}

#[derive(Module, Debug)]
pub struct Generator<B: Backend> {
    pub conv1:      Conv2d<B>,
    pub bn_1:       BatchNorm<B, 2>,
    pub conv2:      Conv2d<B>,
    pub bn_2:       BatchNorm<B, 2>,
    pub residual:   Vec<ResidualBlock<B>>,
    pub upscale:    Vec<UpscaleBlock<B>>,
    pub conv_final: Conv2d<B>,
}

pub struct GeneratorOutput<B: Backend> {
    /// tanh output in [-1, 1]; the total-variation penalty reads this.
    pub bounded: Tensor<B, 4>,
    /// Denormalised image in pixel range [0, 255].
    pub image:   Tensor<B, 4>,
}

impl<B: Backend> Generator<B> {
    /// input: [batch, 3, h, w] in [0, 1] → [batch, 3, h·2^n, w·2^n]
    pub fn forward(&self, input: Tensor<B, 4>) -> GeneratorOutput<B> {
        let x = leaky_relu(self.bn_1.forward(self.conv1.forward(input)), SLOPE);
        let mut x = leaky_relu(self.bn_2.forward(self.conv2.forward(x)), SLOPE);

        for block in &self.residual {
            x = block.forward(x);
        }
        for block in &self.upscale {
            x = block.forward(x);
        }

        let bounded = self.conv_final.forward(x).tanh();
        let image   = (bounded.clone() + 1.0) * 127.5;
        GeneratorOutput { bounded, image }
    }
}

impl<B: AutodiffBackend> Generator<B> {
    /// Inference without autodiff bookkeeping; returns the [0, 255] image.
    pub fn infer(&self, input: Tensor<B::InnerBackend, 4>) -> Tensor<B::InnerBackend, 4> {
        self.valid().forward(input).image
    }
}

impl<B: Backend> WeightRegistry for Generator<B> {
    const PREFIX:  &'static str = "sr_res_";
    const NETWORK: &'static str = "generator";

    fn registry(&self) -> LayerRegistry {
        let mut entries = vec![
            conv_entry("sr_res_conv1", &self.conv1),
            norm_entry("sr_res_bn_1", &self.bn_1),
            conv_entry("sr_res_conv2", &self.conv2),
            norm_entry("sr_res_bn_2", &self.bn_2),
        ];
        for (i, block) in self.residual.iter().enumerate() {
            let id = i + 1;
            entries.push(conv_entry(format!("sr_res_conv_{id}_1"), &block.conv_1));
            entries.push(norm_entry(format!("sr_res_bn_{id}_1"), &block.bn_1));
            entries.push(conv_entry(format!("sr_res_conv_{id}_2"), &block.conv_2));
            entries.push(norm_entry(format!("sr_res_bn_{id}_2"), &block.bn_2));
        }
        for (i, block) in self.upscale.iter().enumerate() {
            let id = i + 1;
            entries.push(conv_entry(format!("sr_res_upconv1_{id}"), &block.upconv));
            entries.push(conv_entry(format!("sr_res_filter1_{id}"), &block.filter));
        }
        entries.push(conv_entry("sr_res_conv_final", &self.conv_final));
        collect(entries)
    }
}
