// ============================================================
// Layer 5 — Training Orchestrator
// ============================================================
// One streaming loop shared by the three training modes.
//
//   for epoch:
//     loop:
//       stop flag?            → save, leave both loops
//       next batch (blocking)
//       validation interval?  → PSNR + PNGs, advance, skip training
//       mode step:
//         pretrain-generator     G step
//         pretrain-discriminator D step (G inference only)
//         full-adversarial       D step, then G step
//       advance by batch size
//       checkpoint interval?  → save weights + history
//       image budget reached? → end of epoch
//     save weights + history
//
// Each subnetwork has its own Adam optimizer and gradients are
// extracted only from that module's parameters, so a step never
// touches weights it does not own. The feature extractor is
// loaded frozen and has no optimizer.
//
// Reference: Burn Book §5 (Custom Training Loop),
//            Kingma & Ba (2015) Adam

use anyhow::{anyhow, bail, Result};
use burn::{
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::{path::Path, time::Instant};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::SrBatch,
    degrade::from_planar,
    image_folder::ImageFolder,
    stream::BatchStream,
};
use crate::domain::{
    error::SrganError,
    history::LossHistory,
    mode::TrainingMode,
    psnr::batch_psnr,
    state::TrainingState,
};
use crate::infra::{
    interrupt::StopSignal,
    loss_log::LossLog,
    validation_images::ValidationWriter,
    weights::{load_feature_extractor, WeightStore},
};
use crate::ml::{
    composite::{ModelBuilder, SrganModels},
    discriminator::Discriminator,
    generator::Generator,
    loss::{scalar, LossWeights},
};

/// What one orchestrator run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub mode:              TrainingMode,
    pub epochs_completed:  usize,
    pub training_steps:    usize,
    pub validation_passes: usize,
    pub early_stop:        bool,
}

#[derive(Debug, Clone, Copy)]
pub struct GeneratorMetrics {
    pub total:           f64,
    pub content:         f64,
    pub adversarial:     Option<f64>,
    pub total_variation: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct DiscriminatorMetrics {
    pub loss:     f64,
    pub accuracy: f64,
}

pub fn run_training<B: AutodiffBackend>(
    cfg:    &TrainConfig,
    mode:   TrainingMode,
    stop:   &StopSignal,
    device: &B::Device,
) -> Result<RunSummary> {
    cfg.validate()?;

    // ── Build and load ────────────────────────────────────────────────────────
    let mut models = ModelBuilder::build::<B>(mode, &cfg.network_configs(), device);
    let store = WeightStore::new(&cfg.weights_dir)?;

    if mode.loads_generator() {
        if !store.has_generator() {
            bail!(
                "{} needs generator weights in '{}'; run pretrain-generator first",
                mode, cfg.weights_dir
            );
        }
        models.generator = store.load_generator(models.generator, device)?;
    }
    if mode.loads_discriminator() {
        if let Some(discriminator) = models.discriminator.take() {
            models.discriminator = Some(store.load_discriminator(discriminator, device)?);
        }
    }
    if mode.uses_feature_extractor() {
        let vgg = load_feature_extractor::<B>(Path::new(&cfg.vgg_weights), device)?;
        models.feature_extractor = Some(vgg.no_grad());
    }
    for registry in models.registries() {
        tracing::info!("{} layers, {} parameters", registry.len(), registry.param_count());
    }

    let mut g_optim = AdamConfig::new().init::<B, Generator<B>>();
    let mut d_optim = AdamConfig::new().init::<B, Discriminator<B>>();
    let weights = cfg.loss_weights();

    // ── Data and bookkeeping ──────────────────────────────────────────────────
    let folder = ImageFolder::scan(&cfg.image_dir)?;
    let mut stream = BatchStream::<B>::new(folder, cfg.pair_dims(), cfg.batch_size, cfg.seed, device.clone());

    let log = LossLog::new(&cfg.history_dir, mode)?;
    let mut history = LossHistory::with_keys(mode.history_keys());
    let validation = if mode.runs_validation() {
        Some(ValidationWriter::new(&cfg.validation_dir)?)
    } else {
        None
    };

    let (nb_images, nb_epochs) = cfg.budget(mode);
    let mut state = TrainingState::new();
    let mut summary = RunSummary {
        mode,
        epochs_completed:  0,
        training_steps:    0,
        validation_passes: 0,
        early_stop:        false,
    };

    tracing::info!(
        "Training {} for {} epoch(s) of {} images from a set of {}, batch size {}",
        mode, nb_epochs, nb_images, stream.dataset_len(), cfg.batch_size
    );

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=nb_epochs {
        state.begin_epoch(epoch);
        tracing::info!("Epoch : {}", epoch);

        loop {
            if stop.is_raised() {
                tracing::warn!("Keyboard interrupt detected. Stopping early.");
                state.early_stop = true;
                break;
            }

            let started = Instant::now();
            let batch = stream.next_batch()?;
            let n = batch.len();

            // validation batches are sampled, never trained on
            if let Some(writer) = validation.as_ref() {
                if state.at_interval(cfg.validation_interval) {
                    state.advance(n);
                    let psnr = validate(&models.generator, &batch, writer, epoch, state.iteration)?;
                    history.record("val_psnr", psnr);
                    summary.validation_passes += 1;
                    tracing::info!(
                        "Time required : {:.2}. Average validation PSNR over {} samples = {:.2}",
                        started.elapsed().as_secs_f64(), n, psnr
                    );
                    if state.budget_reached(nb_images) {
                        break;
                    }
                    continue;
                }
            }

            let tracked = match mode {
                TrainingMode::PretrainGenerator => {
                    let (grads, g) = generator_step(&models, weights, &batch)?;
                    models.generator = g_optim.step(cfg.learning_rate, models.generator, grads);
                    record_generator(&mut history, &g);
                    g.total
                }
                TrainingMode::PretrainDiscriminator => {
                    let (grads, d) = discriminator_step(&models, &batch)?;
                    step_discriminator(&mut models, &mut d_optim, cfg.learning_rate, grads)?;
                    record_discriminator(&mut history, &d);
                    d.loss
                }
                TrainingMode::FullAdversarial => {
                    let (grads, d) = discriminator_step(&models, &batch)?;
                    step_discriminator(&mut models, &mut d_optim, cfg.learning_rate, grads)?;
                    record_discriminator(&mut history, &d);

                    let (grads, g) = generator_step(&models, weights, &batch)?;
                    models.generator = g_optim.step(cfg.learning_rate, models.generator, grads);
                    record_generator(&mut history, &g);
                    d.loss
                }
            };

            state.advance(n);
            summary.training_steps += 1;

            let improvement = state
                .improvement
                .observe(tracked)
                .map(|p| format!("{p:.2}"))
                .unwrap_or_else(|| "n/a".to_string());
            tracing::info!(
                "Iter : {} / {} | Improvement : {} percent | Time required : {:.2} seconds | Loss : {:.3}",
                state.iteration, nb_images, improvement, started.elapsed().as_secs_f64(), tracked
            );

            if state.at_interval(cfg.checkpoint_interval) {
                tracing::info!("Saving model weights.");
                persist(&models, &store, &log, &history)?;
            }
            if state.budget_reached(nb_images) {
                break;
            }
        }

        persist(&models, &store, &log, &history)?;
        if state.early_stop {
            break;
        }
        summary.epochs_completed += 1;
    }

    summary.early_stop = state.early_stop;
    tracing::info!(
        "Finished {}: {} epoch(s), {} training steps, {} validation passes, {} pass(es) over the images",
        mode, summary.epochs_completed, summary.training_steps, summary.validation_passes, stream.passes()
    );
    Ok(summary)
}

/// One generator update's gradients, restricted to generator parameters.
pub fn generator_step<B: AutodiffBackend>(
    models:  &SrganModels<B>,
    weights: LossWeights,
    batch:   &SrBatch<B>,
) -> Result<(GradientsParams, GeneratorMetrics)> {
    let graph = models.graph(weights);
    let (loss, _) = graph.generator_loss(batch.low_res.clone(), batch.high_res.clone() * 255.0)?;

    let metrics = GeneratorMetrics {
        total:           scalar(&loss.total),
        content:         scalar(&loss.content),
        adversarial:     loss.adversarial.as_ref().map(|t| scalar(t)),
        total_variation: scalar(&loss.total_variation),
    };
    let grads = loss.total.backward();
    Ok((GradientsParams::from_grads(grads, &models.generator), metrics))
}

/// One discriminator update's gradients. Fakes come from generator
/// inference, so the generator is never part of this graph.
pub fn discriminator_step<B: AutodiffBackend>(
    models: &SrganModels<B>,
    batch:  &SrBatch<B>,
) -> Result<(GradientsParams, DiscriminatorMetrics)> {
    let discriminator = models.discriminator.as_ref().ok_or(SrganError::MissingSubnetwork {
        mode:       models.mode.name(),
        subnetwork: "discriminator",
    })?;

    let fakes = Tensor::<B, 4>::from_inner(models.generator.infer(batch.low_res.clone().inner()));
    let reals = batch.high_res.clone() * 255.0;
    let out = models
        .graph(LossWeights::default())
        .discriminator_loss(fakes, reals)?;

    let metrics = DiscriminatorMetrics { loss: scalar(&out.loss), accuracy: out.accuracy };
    let grads = out.loss.backward();
    Ok((GradientsParams::from_grads(grads, discriminator), metrics))
}

fn step_discriminator<B: AutodiffBackend, O: Optimizer<Discriminator<B>, B>>(
    models: &mut SrganModels<B>,
    optim:  &mut O,
    lr:     f64,
    grads:  GradientsParams,
) -> Result<()> {
    let discriminator = models.discriminator.take().ok_or(SrganError::MissingSubnetwork {
        mode:       models.mode.name(),
        subnetwork: "discriminator",
    })?;
    models.discriminator = Some(optim.step(lr, discriminator, grads));
    Ok(())
}

fn record_generator(history: &mut LossHistory, g: &GeneratorMetrics) {
    history.record("generator_loss", g.total);
    history.record("content_loss", g.content);
    if let Some(adversarial) = g.adversarial {
        history.record("adversarial_loss", adversarial);
    }
    history.record("tv_loss", g.total_variation);
}

fn record_discriminator(history: &mut LossHistory, d: &DiscriminatorMetrics) {
    history.record("discriminator_loss", d.loss);
    history.record("discriminator_acc", d.accuracy);
}

/// Mean PSNR of the batch (peak 1.0) and one PNG pair per image.
fn validate<B: AutodiffBackend>(
    generator: &Generator<B>,
    batch:     &SrBatch<B>,
    writer:    &ValidationWriter,
    epoch:     usize,
    iteration: usize,
) -> Result<f64> {
    let generated = generator
        .infer(batch.low_res.clone().inner())
        .clamp(0.0, 255.0);
    let [n, _, height, width] = generated.dims();

    let generated = pixels(generated)?;
    let real = pixels(batch.high_res.clone().inner())?;
    let generated_unit: Vec<f32> = generated.iter().map(|p| p / 255.0).collect();
    let psnr = batch_psnr(&real, &generated_unit, n, 1.0);

    let per_image = real.len() / n.max(1);
    for (k, (real, generated)) in real
        .chunks(per_image)
        .zip(generated.chunks(per_image))
        .enumerate()
    {
        let real_pixels: Vec<f32> = real.iter().map(|p| p * 255.0).collect();
        writer.write_pair(
            epoch,
            iteration,
            k + 1,
            &from_planar(&real_pixels, width as u32, height as u32),
            &from_planar(generated, width as u32, height as u32),
        )?;
    }
    Ok(psnr)
}

fn pixels<B: Backend>(tensor: Tensor<B, 4>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read tensor data: {e:?}"))
}

/// Save the weights this mode owns, then flush the loss history.
fn persist<B: Backend>(
    models:  &SrganModels<B>,
    store:   &WeightStore,
    log:     &LossLog,
    history: &LossHistory,
) -> Result<()> {
    if models.mode.saves_generator() {
        store.save_generator(&models.generator)?;
    }
    if models.mode.saves_discriminator() {
        if let Some(discriminator) = &models.discriminator {
            store.save_discriminator(discriminator)?;
        }
    }
    log.flush(history)
}
