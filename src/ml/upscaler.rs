use anyhow::{anyhow, Result};
use burn::{prelude::*, tensor::TensorData};
use image::RgbImage;

use crate::data::degrade::{from_planar, to_planar};
use crate::ml::generator::Generator;

/// Runs a trained generator on single images of any size.
pub struct Upscaler<B: Backend> {
    generator: Generator<B>,
    device:    B::Device,
}

impl<B: Backend> Upscaler<B> {
    pub fn new(generator: Generator<B>, device: B::Device) -> Self {
        Self { generator, device }
    }

    pub fn upscale(&self, image: &RgbImage) -> Result<RgbImage> {
        let (width, height) = image.dimensions();
        let input = Tensor::<B, 4>::from_data(
            TensorData::new(to_planar(image), [1, 3, height as usize, width as usize]),
            &self.device,
        );

        let output = self.generator.forward(input).image.clamp(0.0, 255.0);
        let [_, _, out_h, out_w] = output.dims();
        let pixels = output
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read generator output: {e:?}"))?;

        tracing::debug!("Upscaled {}x{} → {}x{}", width, height, out_w, out_h);
        Ok(from_planar(&pixels, out_w as u32, out_h as u32))
    }
}
