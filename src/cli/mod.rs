// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands off to Layer 2.
//
//   1. `train`   — one stage or the full three-stage sequence
//   2. `upscale` — apply a trained generator to one image
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, TrainArgs, UpscaleArgs};
use std::path::Path;

#[derive(Parser, Debug)]
#[command(
    name = "srgan-trainer",
    version = "0.1.0",
    about = "Train a super-resolution GAN on a directory of images, then upscale with it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Upscale(args) => run_upscale(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let stages = args.stage.modes();
    tracing::info!("Training on images in: {}", args.image_dir);

    let summaries = TrainUseCase::new(args.into()).execute(&stages)?;
    for s in &summaries {
        println!(
            "{}: {} epoch(s), {} steps, {} validation passes{}",
            s.mode,
            s.epochs_completed,
            s.training_steps,
            s.validation_passes,
            if s.early_stop { " (interrupted)" } else { "" },
        );
    }
    Ok(())
}

fn run_upscale(args: UpscaleArgs) -> Result<()> {
    use crate::application::upscale_use_case::UpscaleUseCase;

    let use_case = UpscaleUseCase::new(&args.weights_dir)?;
    let (w, h) = use_case.upscale_file(Path::new(&args.input), Path::new(&args.output))?;
    println!("Wrote {}x{} image to {}", w, h, args.output);
    Ok(())
}
