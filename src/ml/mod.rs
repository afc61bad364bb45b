// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All network definitions and the training loop.
//
//   pixel_shuffle.rs     — depth-to-space and its exact inverse
//   registry.rs          — registry entries read from live layers
//   generator.rs         — SR residual network, 2^n upscaling
//   discriminator.rs     — strided conv critic, sigmoid output
//   feature_extractor.rs — frozen VGG16 trunk for the perceptual loss
//   loss.rs              — content, adversarial, TV and BCE terms
//   composite.rs         — per-mode model assembly and loss graph
//   trainer.rs           — the streaming training loop
//   upscaler.rs          — inference on single images
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Ledig et al. (2017) Photo-Realistic Single Image
//            Super-Resolution Using a GAN

pub mod pixel_shuffle;

pub mod registry;

/// Super-resolution generator
pub mod generator;

/// Adversarial critic
pub mod discriminator;

/// VGG16 perceptual feature extractor
pub mod feature_extractor;

pub mod loss;

/// Mode-dependent model assembly
pub mod composite;

/// Training orchestrator
pub mod trainer;

/// Single-image inference
pub mod upscaler;
