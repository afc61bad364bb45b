// ============================================================
// Layer 3 — Training Mode
// ============================================================
// The three mutually exclusive stages of SRGAN training.
// Each stage decides which subnetworks are built, which
// weights are loaded and saved, and which metrics are logged.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingMode {
    /// Generator + feature extractor, perceptual and TV loss only.
    PretrainGenerator,
    /// Frozen generator + discriminator, binary cross-entropy.
    PretrainDiscriminator,
    /// All three subnetworks, alternating discriminator / generator steps.
    FullAdversarial,
}

impl TrainingMode {
    /// Stage order used by the full training sequence.
    pub const SEQUENCE: [TrainingMode; 3] = [
        TrainingMode::PretrainGenerator,
        TrainingMode::PretrainDiscriminator,
        TrainingMode::FullAdversarial,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TrainingMode::PretrainGenerator     => "pretrain-generator",
            TrainingMode::PretrainDiscriminator => "pretrain-discriminator",
            TrainingMode::FullAdversarial       => "full-adversarial",
        }
    }

    pub fn uses_generator_graph(self) -> bool {
        !matches!(self, TrainingMode::PretrainDiscriminator)
    }

    pub fn uses_discriminator(self) -> bool {
        !matches!(self, TrainingMode::PretrainGenerator)
    }

    pub fn uses_feature_extractor(self) -> bool {
        self.uses_generator_graph()
    }

    /// A fresh generator pretrain starts from random weights.
    pub fn loads_generator(self) -> bool {
        !matches!(self, TrainingMode::PretrainGenerator)
    }

    pub fn loads_discriminator(self) -> bool {
        matches!(self, TrainingMode::FullAdversarial)
    }

    /// Discriminator pretraining never overwrites generator weights.
    pub fn saves_generator(self) -> bool {
        !matches!(self, TrainingMode::PretrainDiscriminator)
    }

    /// Generator pretraining never overwrites discriminator weights.
    pub fn saves_discriminator(self) -> bool {
        !matches!(self, TrainingMode::PretrainGenerator)
    }

    /// Validation samples the generator, so it only runs when the generator trains.
    pub fn runs_validation(self) -> bool {
        self.uses_generator_graph()
    }

    /// File the loss history of this mode is flushed to.
    pub fn history_file(self) -> &'static str {
        match self {
            TrainingMode::PretrainGenerator     => "pretrain losses - srgan.json",
            TrainingMode::PretrainDiscriminator => "pretrain losses - discriminator.json",
            TrainingMode::FullAdversarial       => "fulltrain losses.json",
        }
    }

    /// Metric keys recorded by this mode, in output order.
    pub fn history_keys(self) -> &'static [&'static str] {
        match self {
            TrainingMode::PretrainGenerator => &[
                "generator_loss",
                "content_loss",
                "tv_loss",
                "val_psnr",
            ],
            TrainingMode::PretrainDiscriminator => &[
                "discriminator_loss",
                "discriminator_acc",
            ],
            TrainingMode::FullAdversarial => &[
                "discriminator_loss",
                "discriminator_acc",
                "generator_loss",
                "content_loss",
                "adversarial_loss",
                "tv_loss",
                "val_psnr",
            ],
        }
    }
}

impl fmt::Display for TrainingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_rules_never_cross_modes() {
        assert!(!TrainingMode::PretrainDiscriminator.saves_generator());
        assert!(!TrainingMode::PretrainGenerator.saves_discriminator());
        assert!(TrainingMode::FullAdversarial.saves_generator());
        assert!(TrainingMode::FullAdversarial.saves_discriminator());
    }

    #[test]
    fn test_fresh_generator_pretrain_loads_nothing() {
        let m = TrainingMode::PretrainGenerator;
        assert!(!m.loads_generator());
        assert!(!m.loads_discriminator());
    }

    #[test]
    fn test_history_files_are_distinct() {
        let names: Vec<_> = TrainingMode::SEQUENCE.iter().map(|m| m.history_file()).collect();
        assert_ne!(names[0], names[1]);
        assert_ne!(names[1], names[2]);
        assert_ne!(names[0], names[2]);
    }
}
