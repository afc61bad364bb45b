// ============================================================
// Layer 5 — Composite Model
// ============================================================
// Builds the subnetworks one training mode needs and exposes a
// borrowing view that computes that mode's losses.
//
//   PretrainGenerator     → Generator + FeatureExtractor
//   PretrainDiscriminator → Generator (inference only) + Discriminator
//   FullAdversarial       → Generator + Discriminator + FeatureExtractor
//
// Subnetwork identity is carried by struct fields. The graph owns
// no weights; the orchestrator keeps ownership so each optimizer
// can step its own module.

use anyhow::Result;
use burn::prelude::*;

use crate::domain::{error::SrganError, mode::TrainingMode, registry::LayerRegistry};
use crate::ml::{
    discriminator::{Discriminator, DiscriminatorConfig},
    feature_extractor::{FeatureExtractor, FeatureTap},
    generator::{Generator, GeneratorConfig, GeneratorOutput},
    loss::{
        accuracy, adversarial_loss, binary_cross_entropy, content_loss,
        fake_then_real_labels, total_variation, GeneratorLoss, LossWeights,
    },
    registry::WeightRegistry,
};

/// Architecture of every subnetwork, fixed before the graph is built.
#[derive(Debug, Clone)]
pub struct NetworkConfigs {
    pub generator:     GeneratorConfig,
    pub discriminator: DiscriminatorConfig,
}

/// The subnetworks owned by one orchestrator run.
#[derive(Debug)]
pub struct SrganModels<B: Backend> {
    pub mode:              TrainingMode,
    pub generator:         Generator<B>,
    pub discriminator:     Option<Discriminator<B>>,
    pub feature_extractor: Option<FeatureExtractor<B>>,
}

pub struct ModelBuilder;

impl ModelBuilder {
    pub fn build<B: Backend>(
        mode:    TrainingMode,
        configs: &NetworkConfigs,
        device:  &B::Device,
    ) -> SrganModels<B> {
        let generator = configs.generator.init(device);
        let discriminator = mode
            .uses_discriminator()
            .then(|| configs.discriminator.init(device));
        let feature_extractor = mode
            .uses_feature_extractor()
            .then(|| FeatureExtractor::new(device));

        tracing::info!(
            "Built {} graph: generator={} discriminator={} feature_extractor={}",
            mode,
            true,
            discriminator.is_some(),
            feature_extractor.is_some(),
        );
        SrganModels { mode, generator, discriminator, feature_extractor }
    }
}

impl<B: Backend> SrganModels<B> {
    pub fn graph(&self, weights: LossWeights) -> CompositeGraph<'_, B> {
        CompositeGraph {
            mode:              self.mode,
            generator:         &self.generator,
            discriminator:     self.discriminator.as_ref(),
            feature_extractor: self.feature_extractor.as_ref(),
            weights,
        }
    }

    /// Registries of every built subnetwork, generator first.
    pub fn registries(&self) -> Vec<LayerRegistry> {
        let mut all = vec![self.generator.registry()];
        if let Some(d) = &self.discriminator {
            all.push(d.registry());
        }
        if let Some(f) = &self.feature_extractor {
            all.push(f.registry());
        }
        all
    }
}

pub struct CompositeGraph<'a, B: Backend> {
    pub mode:              TrainingMode,
    pub generator:         &'a Generator<B>,
    pub discriminator:     Option<&'a Discriminator<B>>,
    pub feature_extractor: Option<&'a FeatureExtractor<B>>,
    pub weights:           LossWeights,
}

pub struct DiscriminatorLoss<B: Backend> {
    pub loss:     Tensor<B, 1>,
    pub accuracy: f64,
}

impl<'a, B: Backend> CompositeGraph<'a, B> {
    fn discriminator(&self) -> Result<&'a Discriminator<B>, SrganError> {
        self.discriminator.ok_or(SrganError::MissingSubnetwork {
            mode:       self.mode.name(),
            subnetwork: "discriminator",
        })
    }

    fn feature_extractor(&self) -> Result<&'a FeatureExtractor<B>, SrganError> {
        self.feature_extractor.ok_or(SrganError::MissingSubnetwork {
            mode:       self.mode.name(),
            subnetwork: "feature extractor",
        })
    }

    /// Perceptual tap and its weight for this mode.
    fn content_tap(&self) -> (FeatureTap, f64) {
        match self.mode {
            TrainingMode::FullAdversarial => (FeatureTap::Conv5_3, self.weights.content),
            _ => (FeatureTap::Conv2_2, self.weights.content / 4.0),
        }
    }

    /// Forward the generator and combine every loss term for this mode.
    ///
    /// low_res: [batch, 3, h, w] in [0, 1]; high_res: [batch, 3, H, W] in [0, 255].
    pub fn generator_loss(
        &self,
        low_res:  Tensor<B, 4>,
        high_res: Tensor<B, 4>,
    ) -> Result<(GeneratorLoss<B>, GeneratorOutput<B>)> {
        let vgg = self.feature_extractor()?;
        let batch = low_res.dims()[0];
        let output = self.generator.forward(low_res);

        // generated and ground truth share one pass along the batch axis
        let (tap, content_weight) = self.content_tap();
        let features = vgg.forward_to(Tensor::cat(vec![output.image.clone(), high_res], 0), tap);
        let [_, c, h, w] = features.dims();
        let generated = features.clone().slice([0..batch, 0..c, 0..h, 0..w]);
        let target    = features.slice([batch..2 * batch, 0..c, 0..h, 0..w]);
        let content = content_loss(generated, target) * content_weight;

        let adversarial = match self.mode {
            TrainingMode::FullAdversarial => {
                let logits = self.discriminator()?.forward_logits(output.image.clone());
                Some(adversarial_loss(logits) * self.weights.adversarial)
            }
            _ => None,
        };

        let tv = total_variation(output.bounded.clone()) * self.weights.total_variation;
        Ok((GeneratorLoss::new(content, adversarial, tv), output))
    }

    /// BCE of the discriminator on generated images (label 0) then real ones (label 1).
    pub fn discriminator_loss(
        &self,
        fakes: Tensor<B, 4>,
        reals: Tensor<B, 4>,
    ) -> Result<DiscriminatorLoss<B>> {
        let discriminator = self.discriminator()?;
        let (n_fake, n_real) = (fakes.dims()[0], reals.dims()[0]);
        let labels = fake_then_real_labels::<B>(n_fake, n_real, &fakes.device());

        let logits = discriminator.forward_logits(Tensor::cat(vec![fakes, reals], 0));
        let accuracy = accuracy(logits.clone(), labels.clone());
        let loss = binary_cross_entropy(logits, labels);
        Ok(DiscriminatorLoss { loss, accuracy })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use std::collections::HashSet;

    type TestBackend = NdArray;

    fn configs() -> NetworkConfigs {
        NetworkConfigs {
            generator: GeneratorConfig::new()
                .with_channels(4)
                .with_nb_upscales(1)
                .with_small(true),
            discriminator: DiscriminatorConfig::new(16, 16).with_small(true),
        }
    }

    #[test]
    fn test_modes_build_expected_subnetworks() {
        let device = Default::default();
        let m = ModelBuilder::build::<TestBackend>(TrainingMode::PretrainGenerator, &configs(), &device);
        assert!(m.discriminator.is_none() && m.feature_extractor.is_some());

        let m = ModelBuilder::build::<TestBackend>(TrainingMode::PretrainDiscriminator, &configs(), &device);
        assert!(m.discriminator.is_some() && m.feature_extractor.is_none());

        let m = ModelBuilder::build::<TestBackend>(TrainingMode::FullAdversarial, &configs(), &device);
        assert!(m.discriminator.is_some() && m.feature_extractor.is_some());
    }

    #[test]
    fn test_registry_prefixes_partition_the_union() {
        let device = Default::default();
        let m = ModelBuilder::build::<TestBackend>(TrainingMode::FullAdversarial, &configs(), &device);
        let registries = m.registries();
        let prefixes = ["sr_res_", "gan_", "vgg_"];

        for (registry, prefix) in registries.iter().zip(prefixes) {
            assert!(registry.all_prefixed(prefix));
            for other in prefixes.iter().filter(|p| **p != prefix) {
                assert!(registry.names().all(|n| !n.starts_with(other)));
            }
        }

        let mut seen = HashSet::new();
        for name in registries.iter().flat_map(|r| r.names()) {
            assert!(seen.insert(name.to_string()), "duplicate layer {name}");
        }
    }

    #[test]
    fn test_missing_subnetwork_is_typed_error() {
        let device = Default::default();
        let m = ModelBuilder::build::<TestBackend>(TrainingMode::PretrainGenerator, &configs(), &device);
        let graph = m.graph(LossWeights::default());
        let x = Tensor::<TestBackend, 4>::zeros([1, 3, 16, 16], &device);
        let err = graph.discriminator_loss(x.clone(), x).err().unwrap();
        assert_eq!(
            err.downcast_ref::<SrganError>(),
            Some(&SrganError::MissingSubnetwork {
                mode: "pretrain-generator",
                subnetwork: "discriminator",
            })
        );
    }

    #[test]
    fn test_pretrain_loss_has_no_adversarial_term() {
        let device = Default::default();
        let m = ModelBuilder::build::<TestBackend>(TrainingMode::PretrainGenerator, &configs(), &device);
        let graph = m.graph(LossWeights::default());
        let low  = Tensor::<TestBackend, 4>::full([1, 3, 8, 8], 0.5, &device);
        let high = Tensor::<TestBackend, 4>::full([1, 3, 16, 16], 128.0, &device);
        let (loss, output) = graph.generator_loss(low, high).unwrap();
        assert!(loss.adversarial.is_none());
        assert_eq!(output.image.dims(), [1, 3, 16, 16]);
        assert!(loss.total.into_scalar().elem::<f64>().is_finite());
    }
}
