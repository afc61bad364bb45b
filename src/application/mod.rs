// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: no tensor math, no printing.
//
//   train_use_case.rs   — config validation and persistence,
//                         stage sequencing
//   upscale_use_case.rs — rebuild a trained generator and apply
//                         it to an image file
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// Inference on a single image
pub mod upscale_use_case;
