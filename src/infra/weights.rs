// ============================================================
// Layer 6 — Weight Store
// ============================================================
// Saves and restores subnetwork weights as keyed archives.
//
// What gets written per subnetwork:
//   1. <stem>.mpk.gz       — Burn named MessagePack record (gzip);
//                            every tensor is addressed by its
//                            field path, never by position
//   2. <stem>.layers.json  — the live layer registry
//
// Before a load assigns anything, the stored manifest is compared
// with the registry of the network being loaded into: layer count
// first, then names, then shapes. Any difference is fatal.
//
// File layout:
//   weights/
//     SRGAN.mpk.gz                      ← generator
//     SRGAN.layers.json
//     Discriminator weights.mpk.gz      ← discriminator
//     Discriminator weights.layers.json
//     train_config.json                 ← architecture for the upscaler
//
// The feature extractor is loaded from its own path, either a
// native archive with manifest or a torchvision .pth state dict.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{ensure, Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::registry::LayerRegistry;
use crate::ml::{
    discriminator::Discriminator,
    feature_extractor::{FeatureExtractor, FeatureExtractorRecord},
    generator::Generator,
    registry::WeightRegistry,
};

pub const GENERATOR_STEM:     &str = "SRGAN";
pub const DISCRIMINATOR_STEM: &str = "Discriminator weights";
pub const CONFIG_FILE:        &str = "train_config.json";

const ARCHIVE_EXTENSION:  &str = "mpk.gz";
const MANIFEST_EXTENSION: &str = "layers.json";

/// torchvision `vgg16().features` indices of the 13 convolutions.
const TORCHVISION_VGG16: [(usize, &str); 13] = [
    (0, "conv1_1"), (2, "conv1_2"),
    (5, "conv2_1"), (7, "conv2_2"),
    (10, "conv3_1"), (12, "conv3_2"), (14, "conv3_3"),
    (17, "conv4_1"), (19, "conv4_2"), (21, "conv4_3"),
    (24, "conv5_1"), (26, "conv5_2"), (28, "conv5_3"),
];

fn recorder() -> NamedMpkGzFileRecorder<FullPrecisionSettings> {
    NamedMpkGzFileRecorder::<FullPrecisionSettings>::new()
}

/// Owns the weights directory.
pub struct WeightStore {
    dir: PathBuf,
}

impl WeightStore {
    /// Create the store, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create weights directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn archive_path(&self, stem: &str) -> PathBuf {
        self.dir.join(format!("{stem}.{ARCHIVE_EXTENSION}"))
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn has_generator(&self) -> bool {
        self.archive_path(GENERATOR_STEM).exists()
    }

    pub fn save_generator<B: Backend>(&self, generator: &Generator<B>) -> Result<()> {
        save_archive::<B, _>(&self.dir.join(GENERATOR_STEM), generator)
    }

    pub fn load_generator<B: Backend>(
        &self,
        generator: Generator<B>,
        device:    &B::Device,
    ) -> Result<Generator<B>> {
        load_archive::<B, _>(&self.dir.join(GENERATOR_STEM), generator, device)
    }

    pub fn save_discriminator<B: Backend>(&self, discriminator: &Discriminator<B>) -> Result<()> {
        save_archive::<B, _>(&self.dir.join(DISCRIMINATOR_STEM), discriminator)
    }

    pub fn load_discriminator<B: Backend>(
        &self,
        discriminator: Discriminator<B>,
        device:        &B::Device,
    ) -> Result<Discriminator<B>> {
        load_archive::<B, _>(&self.dir.join(DISCRIMINATOR_STEM), discriminator, device)
    }
}

/// Write `<base>.mpk.gz` and `<base>.layers.json`.
pub fn save_archive<B: Backend, M: Module<B> + WeightRegistry>(base: &Path, module: &M) -> Result<()> {
    let registry = module.registry();
    ensure!(
        registry.all_prefixed(M::PREFIX),
        "{} registry has layers outside the '{}' prefix",
        M::NETWORK, M::PREFIX
    );
    let manifest = with_suffix(base, MANIFEST_EXTENSION);
    let json = serde_json::to_string_pretty(&registry)?;
    fs::write(&manifest, json)
        .with_context(|| format!("Cannot write layer manifest '{}'", manifest.display()))?;

    module
        .clone()
        .save_file(base.to_path_buf(), &recorder())
        .with_context(|| format!("Failed to save {} weights to '{}'", M::NETWORK, base.display()))?;

    tracing::debug!("Saved {} weights to '{}'", M::NETWORK, base.display());
    Ok(())
}

/// Verify the manifest against `module`, then load `<base>.mpk.gz` into it.
pub fn load_archive<B: Backend, M: Module<B> + WeightRegistry>(
    base:   &Path,
    module: M,
    device: &B::Device,
) -> Result<M> {
    let manifest = with_suffix(base, MANIFEST_EXTENSION);
    let json = fs::read_to_string(&manifest).with_context(|| {
        format!("Cannot read layer manifest '{}'. Has this network been trained?", manifest.display())
    })?;
    let archived: LayerRegistry = serde_json::from_str(&json)
        .with_context(|| format!("Malformed layer manifest '{}'", manifest.display()))?;

    let archive = with_suffix(base, ARCHIVE_EXTENSION);
    module
        .registry()
        .verify_archive(&archived, M::NETWORK, &archive.display().to_string())?;

    let module = module
        .load_file(base.to_path_buf(), &recorder(), device)
        .with_context(|| format!("Cannot load {} weights from '{}'", M::NETWORK, archive.display()))?;

    tracing::info!("Loaded {} weights ({} layers)", M::NETWORK, archived.len());
    Ok(module)
}

/// Load VGG16 weights from a native archive or a torchvision state dict.
pub fn load_feature_extractor<B: Backend>(path: &Path, device: &B::Device) -> Result<FeatureExtractor<B>> {
    let fresh = FeatureExtractor::new(device);
    let is_pytorch = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("pth") | Some("pt")
    );
    if !is_pytorch {
        let base = strip_archive_suffix(path);
        return load_archive::<B, _>(&base, fresh, device);
    }

    let mut args = LoadArgs::new(path.to_path_buf());
    for (index, field) in TORCHVISION_VGG16 {
        args = args.with_key_remap(&format!(r"^features\.{index}\.(.+)$"), &format!("{field}.$1"));
    }
    let record: FeatureExtractorRecord<B> = PyTorchFileRecorder::<FullPrecisionSettings>::default()
        .load(args, device)
        .with_context(|| format!("Cannot load VGG16 state dict '{}'", path.display()))?;

    tracing::info!("Loaded feature extractor weights from '{}'", path.display());
    Ok(fresh.load_record(record))
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// `vgg16.mpk.gz` → `vgg16`; a bare stem is returned unchanged.
fn strip_archive_suffix(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    match text.strip_suffix(&format!(".{ARCHIVE_EXTENSION}")) {
        Some(stem) => PathBuf::from(stem),
        None => path.to_path_buf(),
    }
}
