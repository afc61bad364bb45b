// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that describe a training run. Nothing here
// touches Burn, the filesystem or images, so every type can be
// unit tested without a device.
//
//   mode.rs      — the three training modes and their file names
//   state.rs     — iteration / epoch bookkeeping and improvement %
//   history.rs   — append-only loss history (serialised as JSON)
//   psnr.rs      — peak signal-to-noise ratio on pixel slices
//   registry.rs  — named layer inventory used to validate archives
//   error.rs     — typed errors for fatal preconditions
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

pub mod error;
pub mod history;
pub mod mode;
pub mod psnr;
pub mod registry;
pub mod state;
