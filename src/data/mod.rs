// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from an image directory to tensor batches.
//
//   image directory
//       │
//       ▼
//   ImageFolder     → recursive, sorted list of image paths
//       │
//       ▼
//   CyclingSampler  → seeded reshuffle on every pass
//       │
//       ▼
//   degrade         → decode, resize, blur, downsample
//       │
//       ▼
//   SrBatcher       → stacks pairs into [N, 3, H, W] tensors
//       │
//       ▼
//   BatchStream     → one blocking call per batch
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Recursive image directory scan, exposed as a Burn Dataset
pub mod image_folder;

/// High-res / low-res pair construction
pub mod degrade;

/// Implements Burn's Batcher trait for training pairs
pub mod batcher;

/// Endless, reshuffled batch stream
pub mod stream;
