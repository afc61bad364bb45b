// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Runs one training stage or the fixed three-stage sequence:
//
//   Stage 1: pretrain generator       (perceptual + TV loss)
//   Stage 2: pretrain discriminator   (BCE, generator frozen)
//   Stage 3: full adversarial         (alternating steps)
//
// Before anything runs, the configuration is validated and saved
// next to the weights so the upscaler can rebuild the generator.
// An interrupted stage ends the sequence.
//
// Reference: Burn Book §5 (Training)

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::data::degrade::PairDims;
use crate::domain::{error::SrganError, mode::TrainingMode};
use crate::infra::{interrupt::StopSignal, weights::WeightStore};
use crate::ml::{
    composite::NetworkConfigs,
    discriminator::DiscriminatorConfig,
    generator::GeneratorConfig,
    loss::LossWeights,
    trainer::{run_training, RunSummary},
};

/// Smallest accepted low-resolution side.
pub const MIN_IMAGE_SIDE: usize = 16;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Image sizes are the
// generator input; the high-resolution side is size · 2^nb_upscales.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub image_dir:           String,
    pub weights_dir:         String,
    pub history_dir:         String,
    pub validation_dir:      String,
    pub vgg_weights:         String,
    pub img_width:           usize,
    pub img_height:          usize,
    pub batch_size:          usize,
    pub nb_upscales:         usize,
    pub gen_channels:        usize,
    pub small_generator:     bool,
    pub small_discriminator: bool,
    pub content_weight:      f64,
    pub adversarial_weight:  f64,
    pub tv_weight:           f64,
    pub learning_rate:       f64,
    pub pretrain_images:     usize,
    pub pretrain_epochs:     usize,
    pub full_images:         usize,
    pub full_epochs:         usize,
    pub validation_interval: usize,
    pub checkpoint_interval: usize,
    pub seed:                u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            image_dir:           "data/images".to_string(),
            weights_dir:         "weights".to_string(),
            history_dir:         ".".to_string(),
            validation_dir:      "val_images".to_string(),
            vgg_weights:         "weights/vgg16.mpk.gz".to_string(),
            img_width:           96,
            img_height:          96,
            batch_size:          16,
            nb_upscales:         2,
            gen_channels:        64,
            small_generator:     false,
            small_discriminator: false,
            content_weight:      1.0,
            adversarial_weight:  1e-3,
            tv_weight:           2e-8,
            learning_rate:       1e-4,
            pretrain_images:     50_000,
            pretrain_epochs:     1,
            full_images:         50_000,
            full_epochs:         10,
            validation_interval: 50,
            checkpoint_interval: 1000,
            seed:                42,
        }
    }
}

impl TrainConfig {
    /// Reject configurations the networks cannot be built for. No I/O happens here.
    pub fn validate(&self) -> Result<()> {
        for (dimension, actual) in [("width", self.img_width), ("height", self.img_height)] {
            if actual < MIN_IMAGE_SIDE {
                return Err(SrganError::ImageTooSmall {
                    dimension,
                    minimum: MIN_IMAGE_SIDE,
                    actual,
                }
                .into());
            }
        }
        ensure!(self.batch_size > 0, "batch size must be positive");
        ensure!(self.nb_upscales > 0, "at least one upscale stage is required");
        for side in [self.img_width, self.img_height] {
            ensure!(
                high_res_side(side, self.nb_upscales).is_some(),
                "{} upscale stages on a {} px side overflow the output image size",
                self.nb_upscales, side
            );
        }
        ensure!(self.gen_channels > 0, "generator needs at least one channel");
        ensure!(self.learning_rate > 0.0, "learning rate must be positive");
        Ok(())
    }

    pub fn scale(&self) -> usize {
        1 << self.nb_upscales
    }

    pub fn pair_dims(&self) -> PairDims {
        PairDims {
            high_width:  (self.img_width * self.scale()) as u32,
            high_height: (self.img_height * self.scale()) as u32,
            low_width:   self.img_width as u32,
            low_height:  self.img_height as u32,
        }
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig::new()
            .with_channels(self.gen_channels)
            .with_nb_upscales(self.nb_upscales)
            .with_small(self.small_generator)
    }

    pub fn network_configs(&self) -> NetworkConfigs {
        NetworkConfigs {
            generator:     self.generator_config(),
            discriminator: DiscriminatorConfig::new(
                self.img_height * self.scale(),
                self.img_width * self.scale(),
            )
            .with_small(self.small_discriminator),
        }
    }

    pub fn loss_weights(&self) -> LossWeights {
        LossWeights {
            content:         self.content_weight,
            adversarial:     self.adversarial_weight,
            total_variation: self.tv_weight,
        }
    }

    /// (images per epoch, epochs) for a stage.
    pub fn budget(&self, mode: TrainingMode) -> (usize, usize) {
        match mode {
            TrainingMode::FullAdversarial => (self.full_images, self.full_epochs),
            _ => (self.pretrain_images, self.pretrain_epochs),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'train' before 'upscale'.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run the given stages in order on the GPU backend.
    pub fn execute(&self, stages: &[TrainingMode]) -> Result<Vec<RunSummary>> {
        type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;
        let device = burn::backend::wgpu::WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);

        let stop = StopSignal::ctrl_c()?;
        self.execute_on::<MyBackend>(stages, &stop, &device)
    }

    pub fn execute_on<B: burn::tensor::backend::AutodiffBackend>(
        &self,
        stages: &[TrainingMode],
        stop:   &StopSignal,
        device: &B::Device,
    ) -> Result<Vec<RunSummary>> {
        let cfg = &self.config;
        cfg.validate()?;

        let store = WeightStore::new(&cfg.weights_dir)?;
        cfg.save(&store.config_path())?;

        let mut summaries = Vec::new();
        for &mode in stages {
            tracing::info!("Starting stage: {}", mode);
            let summary = run_training::<B>(cfg, mode, stop, device)?;
            let interrupted = summary.early_stop;
            summaries.push(summary);
            if interrupted {
                tracing::warn!("Stage {} was interrupted; remaining stages skipped", mode);
                break;
            }
        }
        Ok(summaries)
    }
}

/// `side · 2^nb_upscales` when it fits an image dimension.
fn high_res_side(side: usize, nb_upscales: usize) -> Option<u32> {
    let scale = u32::try_from(nb_upscales).ok().and_then(|n| 1usize.checked_shl(n))?;
    let high = side.checked_mul(scale)?;
    u32::try_from(high).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = TrainConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.pair_dims().high_width, 384);
    }

    #[test]
    fn test_small_images_rejected_before_io() {
        let cfg = TrainConfig {
            img_height: 12,
            image_dir: "/definitely/not/here".into(),
            ..TrainConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert_eq!(
            err.downcast_ref::<SrganError>(),
            Some(&SrganError::ImageTooSmall { dimension: "height", minimum: 16, actual: 12 })
        );
    }

    #[test]
    fn test_oversized_upscale_count_rejected() {
        for nb_upscales in [26, 64, 200] {
            let cfg = TrainConfig { nb_upscales, ..TrainConfig::default() };
            let err = cfg.validate().unwrap_err().to_string();
            assert!(err.contains("overflow"), "{nb_upscales}: {err}");
        }
        assert_eq!(high_res_side(96, 2), Some(384));
        assert_eq!(high_res_side(1 << 16, 15), Some(1 << 31));
        assert_eq!(high_res_side(1 << 16, 16), None);
    }

    #[test]
    fn test_budget_per_stage() {
        let cfg = TrainConfig { pretrain_images: 10, full_epochs: 3, ..TrainConfig::default() };
        assert_eq!(cfg.budget(TrainingMode::PretrainDiscriminator), (10, 1));
        assert_eq!(cfg.budget(TrainingMode::FullAdversarial), (50_000, 3));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train_config.json");
        let cfg = TrainConfig { gen_channels: 32, small_generator: true, ..TrainConfig::default() };
        cfg.save(&path).unwrap();
        let loaded = TrainConfig::load(&path).unwrap();
        assert_eq!(loaded.gen_channels, 32);
        assert!(loaded.small_generator);
    }

    #[test]
    fn test_interrupted_stage_ends_sequence() {
        use burn::backend::{Autodiff, NdArray};

        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        fs::create_dir_all(&images).unwrap();
        image::RgbImage::from_pixel(32, 32, image::Rgb([90, 20, 200]))
            .save(images.join("a.png"))
            .unwrap();
        let vgg = crate::ml::feature_extractor::FeatureExtractor::<NdArray>::new(&Default::default());
        crate::infra::weights::save_archive::<NdArray, _>(&dir.path().join("vgg16"), &vgg).unwrap();

        let cfg = TrainConfig {
            image_dir:      images.display().to_string(),
            weights_dir:    dir.path().join("weights").display().to_string(),
            history_dir:    dir.path().display().to_string(),
            validation_dir: dir.path().join("val").display().to_string(),
            vgg_weights:    dir.path().join("vgg16").display().to_string(),
            img_width:      16,
            img_height:     16,
            nb_upscales:    1,
            gen_channels:   4,
            small_generator: true,
            ..TrainConfig::default()
        };
        let stop = StopSignal::default();
        stop.trigger();

        let summaries = TrainUseCase::new(cfg)
            .execute_on::<Autodiff<NdArray>>(&TrainingMode::SEQUENCE, &stop, &Default::default())
            .unwrap();
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].early_stop);
        assert_eq!(summaries[0].training_steps, 0);
        assert!(dir.path().join("weights").join("train_config.json").exists());
    }
}
