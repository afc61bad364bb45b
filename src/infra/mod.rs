// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything the trainer writes to disk or receives from the OS:
//
//   weights.rs           — keyed weight archives + layer manifests,
//                          torchvision VGG16 import, run config
//
//   loss_log.rs          — per-mode loss history JSON, rewritten
//                          on every flush
//
//   validation_images.rs — real / generated PNG pairs
//
//   interrupt.rs         — Ctrl-C flag polled by the training loop
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling with anyhow)

/// Keyed weight archives and manifest checks
pub mod weights;

/// Loss history persistence
pub mod loss_log;

/// Validation PNG writer
pub mod validation_images;

/// Cooperative cancellation
pub mod interrupt;
