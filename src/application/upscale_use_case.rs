// ============================================================
// Layer 2 — UpscaleUseCase
// ============================================================
// Loads the generator saved by a training run and applies it to
// one image file.
//
//   Step 1: Read train_config.json   (Layer 6 - infra)
//   Step 2: Rebuild the generator    (Layer 5 - ml)
//   Step 3: Load its weights         (Layer 6 - infra)
//   Step 4: Upscale and write PNG    (Layer 5 - ml)

use anyhow::{Context, Result};
use burn::prelude::*;
use std::path::Path;

use crate::application::train_use_case::TrainConfig;
use crate::infra::weights::WeightStore;
use crate::ml::upscaler::Upscaler;

pub struct UpscaleUseCase<B: Backend> {
    upscaler: Upscaler<B>,
}

impl UpscaleUseCase<burn::backend::Wgpu> {
    pub fn new(weights_dir: &str) -> Result<Self> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        Self::with_device(weights_dir, device)
    }
}

impl<B: Backend> UpscaleUseCase<B> {
    pub fn with_device(weights_dir: &str, device: B::Device) -> Result<Self> {
        let store = WeightStore::new(weights_dir)?;
        let cfg = TrainConfig::load(&store.config_path())?;
        let generator = store.load_generator(cfg.generator_config().init::<B>(&device), &device)?;
        tracing::info!(
            "Generator ready: {} channels, x{} upscaling",
            cfg.gen_channels,
            cfg.scale()
        );
        Ok(Self { upscaler: Upscaler::new(generator, device) })
    }

    pub fn upscale_file(&self, input: &Path, output: &Path) -> Result<(u32, u32)> {
        let image = image::open(input)
            .with_context(|| format!("Cannot decode image '{}'", input.display()))?
            .to_rgb8();
        let upscaled = self.upscaler.upscale(&image)?;
        upscaled
            .save(output)
            .with_context(|| format!("Cannot write '{}'", output.display()))?;
        Ok(upscaled.dimensions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_upscale_from_saved_run() {
        let dir = tempfile::tempdir().unwrap();
        let weights = dir.path().join("weights");
        let cfg = TrainConfig {
            gen_channels: 4,
            nb_upscales: 1,
            small_generator: true,
            ..TrainConfig::default()
        };
        let store = WeightStore::new(&weights).unwrap();
        cfg.save(&store.config_path()).unwrap();
        store
            .save_generator(&cfg.generator_config().init::<NdArray>(&Default::default()))
            .unwrap();

        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        image::RgbImage::from_pixel(10, 6, image::Rgb([5, 6, 7])).save(&input).unwrap();

        let use_case =
            UpscaleUseCase::<NdArray>::with_device(weights.to_str().unwrap(), Default::default()).unwrap();
        assert_eq!(use_case.upscale_file(&input, &output).unwrap(), (20, 12));
        assert_eq!(image::open(&output).unwrap().to_rgb8().dimensions(), (20, 12));
    }

    #[test]
    fn test_missing_run_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = UpscaleUseCase::<NdArray>::with_device(
            dir.path().to_str().unwrap(),
            Default::default(),
        );
        assert!(result.is_err());
    }
}
