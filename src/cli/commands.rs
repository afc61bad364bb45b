// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `upscale`, and all
// their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::TrainConfig;
use crate::domain::mode::TrainingMode;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the SRGAN on a directory of images
    Train(TrainArgs),

    /// Upscale one image with a trained generator
    Upscale(UpscaleArgs),
}

/// Which training stage(s) to run.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Pretrain generator, pretrain discriminator, then full training
    All,
    PretrainGenerator,
    PretrainDiscriminator,
    Full,
}

impl Stage {
    pub fn modes(self) -> Vec<TrainingMode> {
        match self {
            Stage::All                   => TrainingMode::SEQUENCE.to_vec(),
            Stage::PretrainGenerator     => vec![TrainingMode::PretrainGenerator],
            Stage::PretrainDiscriminator => vec![TrainingMode::PretrainDiscriminator],
            Stage::Full                  => vec![TrainingMode::FullAdversarial],
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Stage to run
    #[arg(long, value_enum, default_value_t = Stage::All)]
    pub stage: Stage,

    /// Directory tree of training images (png, jpg, jpeg, bmp)
    #[arg(long, default_value = "data/images")]
    pub image_dir: String,

    /// Where generator / discriminator archives and the run config are kept
    #[arg(long, default_value = "weights")]
    pub weights_dir: String,

    /// Where the loss history JSON files are written
    #[arg(long, default_value = ".")]
    pub history_dir: String,

    /// Where validation PNG pairs are written
    #[arg(long, default_value = "val_images")]
    pub validation_dir: String,

    /// VGG16 weights: native .mpk.gz archive or torchvision .pth
    #[arg(long, default_value = "weights/vgg16.mpk.gz")]
    pub vgg_weights: String,

    /// Generator input width; the output is width · 2^nb_upscales
    #[arg(long, default_value_t = 96)]
    pub img_width: usize,

    /// Generator input height
    #[arg(long, default_value_t = 96)]
    pub img_height: usize,

    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Number of ×2 upscale stages
    #[arg(long, default_value_t = 2)]
    pub nb_upscales: usize,

    /// Feature maps in the generator trunk
    #[arg(long, default_value_t = 64)]
    pub gen_channels: usize,

    /// 5 residual blocks instead of 15
    #[arg(long)]
    pub small_generator: bool,

    /// Fewer discriminator filters and a smaller dense layer
    #[arg(long)]
    pub small_discriminator: bool,

    #[arg(long, default_value_t = 1.0)]
    pub content_weight: f64,

    #[arg(long, default_value_t = 1e-3)]
    pub adversarial_weight: f64,

    #[arg(long, default_value_t = 2e-8)]
    pub tv_weight: f64,

    /// Adam learning rate for both trainable networks
    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    /// Images per epoch in both pretraining stages
    #[arg(long, default_value_t = 50_000)]
    pub pretrain_images: usize,

    #[arg(long, default_value_t = 1)]
    pub pretrain_epochs: usize,

    /// Images per epoch in full training
    #[arg(long, default_value_t = 50_000)]
    pub full_images: usize,

    #[arg(long, default_value_t = 10)]
    pub full_epochs: usize,

    /// Sample the generator every N images
    #[arg(long, default_value_t = 50)]
    pub validation_interval: usize,

    /// Save weights and history every N images
    #[arg(long, default_value_t = 1000)]
    pub checkpoint_interval: usize,

    /// Seed for the data order
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            image_dir:           a.image_dir,
            weights_dir:         a.weights_dir,
            history_dir:         a.history_dir,
            validation_dir:      a.validation_dir,
            vgg_weights:         a.vgg_weights,
            img_width:           a.img_width,
            img_height:          a.img_height,
            batch_size:          a.batch_size,
            nb_upscales:         a.nb_upscales,
            gen_channels:        a.gen_channels,
            small_generator:     a.small_generator,
            small_discriminator: a.small_discriminator,
            content_weight:      a.content_weight,
            adversarial_weight:  a.adversarial_weight,
            tv_weight:           a.tv_weight,
            learning_rate:       a.lr,
            pretrain_images:     a.pretrain_images,
            pretrain_epochs:     a.pretrain_epochs,
            full_images:         a.full_images,
            full_epochs:         a.full_epochs,
            validation_interval: a.validation_interval,
            checkpoint_interval: a.checkpoint_interval,
            seed:                a.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct UpscaleArgs {
    /// Image to upscale
    #[arg(long)]
    pub input: String,

    /// Destination PNG
    #[arg(long)]
    pub output: String,

    /// Directory written by `train`
    #[arg(long, default_value = "weights")]
    pub weights_dir: String,
}
