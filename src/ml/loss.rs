// ============================================================
// Layer 5 — Loss Terms
// ============================================================
// Every term the SRGAN optimises, combined in one place with
// explicit weights:
//
//   generator = content_w · MSE(vgg(G(x)), vgg(y))
//             + adversarial_w · mean(−ln D(G(x)))
//             + tv_w · Σ((Δx² + Δy²)^1.25) / (C·H·W)
//
//   discriminator = BCE(D([G(x); y]), [0…; 1…])
//
// The discriminator terms take raw logits; the sigmoid is folded
// into Burn's binary cross-entropy.

use burn::{
    nn::loss::{BinaryCrossEntropyLossConfig, MseLoss, Reduction},
    prelude::*,
    tensor::{activation::sigmoid, TensorData},
};

/// Explicit per-term weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossWeights {
    pub content:         f64,
    pub adversarial:     f64,
    pub total_variation: f64,
}

impl Default for LossWeights {
    fn default() -> Self {
        Self { content: 1.0, adversarial: 1e-3, total_variation: 2e-8 }
    }
}

/// Weighted generator loss terms. `total` is the only one that is back-propagated.
#[derive(Debug, Clone)]
pub struct GeneratorLoss<B: Backend> {
    pub total:           Tensor<B, 1>,
    pub content:         Tensor<B, 1>,
    pub adversarial:     Option<Tensor<B, 1>>,
    pub total_variation: Tensor<B, 1>,
}

impl<B: Backend> GeneratorLoss<B> {
    pub fn new(
        content:         Tensor<B, 1>,
        adversarial:     Option<Tensor<B, 1>>,
        total_variation: Tensor<B, 1>,
    ) -> Self {
        let mut total = content.clone() + total_variation.clone();
        if let Some(adv) = &adversarial {
            total = total + adv.clone();
        }
        Self { total, content, adversarial, total_variation }
    }
}

/// Mean squared error between generated and target feature maps.
pub fn content_loss<B: Backend>(generated: Tensor<B, 4>, target: Tensor<B, 4>) -> Tensor<B, 1> {
    MseLoss::new().forward(generated, target, Reduction::Mean)
}

/// Anisotropic total variation of the tanh output, normalised by image size.
pub fn total_variation<B: Backend>(bounded: Tensor<B, 4>) -> Tensor<B, 1> {
    let [batch, channels, height, width] = bounded.dims();
    let base = bounded.clone().slice([0..batch, 0..channels, 0..height - 1, 0..width - 1]);
    let down = bounded.clone().slice([0..batch, 0..channels, 1..height, 0..width - 1]);
    let right = bounded.slice([0..batch, 0..channels, 0..height - 1, 1..width]);

    let dy = base.clone() - down;
    let dx = base - right;
    let squared = dy.clone() * dy + dx.clone() * dx;
    squared.powf_scalar(1.25).sum() / (channels * height * width) as f64
}

/// mean(−ln D(G(x))), i.e. BCE of the verdicts on generated images against "real".
pub fn adversarial_loss<B: Backend>(fake_logits: Tensor<B, 2>) -> Tensor<B, 1> {
    let [n, _] = fake_logits.dims();
    let real = Tensor::<B, 2, Int>::ones([n, 1], &fake_logits.device());
    binary_cross_entropy(fake_logits, real)
}

/// Binary cross-entropy between discriminator logits and 0/1 labels.
pub fn binary_cross_entropy<B: Backend>(
    logits: Tensor<B, 2>,
    labels: Tensor<B, 2, Int>,
) -> Tensor<B, 1> {
    BinaryCrossEntropyLossConfig::new()
        .with_logits(true)
        .init(&logits.device())
        .forward(logits, labels)
}

/// Fraction of verdicts on the right side of 0.5.
pub fn accuracy<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 2, Int>) -> f64 {
    let total = logits.dims()[0].max(1) as f64;
    let hits = sigmoid(logits)
        .greater_elem(0.5)
        .equal(labels.equal_elem(1))
        .int()
        .sum()
        .into_scalar()
        .elem::<f64>();
    hits / total
}

/// Labels for a batch laid out as `fakes` generated images then `reals` real ones.
pub fn fake_then_real_labels<B: Backend>(
    fakes:  usize,
    reals:  usize,
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    let mut labels = vec![0i64; fakes];
    labels.resize(fakes + reals, 1);
    Tensor::from_data(TensorData::new(labels, [fakes + reals, 1]), device)
}

pub fn scalar<B: Backend>(loss: &Tensor<B, 1>) -> f64 {
    loss.clone().into_scalar().elem::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn column(values: Vec<f32>) -> Tensor<TestBackend, 2> {
        let n = values.len();
        Tensor::from_data(TensorData::new(values, [n, 1]), &Default::default())
    }

    #[test]
    fn test_tv_of_constant_image_is_zero() {
        let x = Tensor::<TestBackend, 4>::full([2, 3, 8, 8], 0.4, &Default::default());
        assert_eq!(scalar(&total_variation(x)), 0.0);
    }

    #[test]
    fn test_tv_single_step_edge() {
        // One vertical edge of height 1 in a 1×1×2×2 image.
        let x = Tensor::<TestBackend, 4>::from_data(
            TensorData::new(vec![0.0f32, 1.0, 0.0, 1.0], [1, 1, 2, 2]),
            &Default::default(),
        );
        // base=0, down=0, right=1 → (0 + 1)^1.25 / 4
        assert!((scalar(&total_variation(x)) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_bce_of_confident_correct_logits_is_near_zero() {
        let labels = fake_then_real_labels::<TestBackend>(2, 2, &Default::default());
        let logits = column(vec![-20.0, -20.0, 20.0, 20.0]);
        assert!(scalar(&binary_cross_entropy(logits, labels)) < 1e-5);
    }

    #[test]
    fn test_bce_of_zero_logits_is_ln2() {
        let labels = fake_then_real_labels::<TestBackend>(1, 1, &Default::default());
        let loss = scalar(&binary_cross_entropy(column(vec![0.0, 0.0]), labels));
        assert!((loss - std::f64::consts::LN_2).abs() < 1e-5);
    }

    #[test]
    fn test_bce_stays_finite_for_saturated_wrong_logits() {
        let labels = fake_then_real_labels::<TestBackend>(1, 1, &Default::default());
        let loss = scalar(&binary_cross_entropy(column(vec![200.0, -200.0]), labels));
        assert!(loss.is_finite());
        assert!((loss - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_labels_are_fakes_then_reals() {
        let labels = fake_then_real_labels::<TestBackend>(2, 3, &Default::default());
        assert_eq!(labels.dims(), [5, 1]);
        let values: Vec<i64> = labels.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(values, vec![0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_accuracy_counts_correct_side() {
        let labels = fake_then_real_labels::<TestBackend>(2, 2, &Default::default());
        let logits = column(vec![-2.0, 1.0, 2.0, -1.0]);
        assert!((accuracy(logits, labels) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_adversarial_loss_falls_as_verdict_rises() {
        let logit = |p: f64| (p / (1.0 - p)).ln() as f32;
        let fooled = scalar(&adversarial_loss(column(vec![logit(0.9), logit(0.9)])));
        let caught = scalar(&adversarial_loss(column(vec![logit(0.1), logit(0.1)])));
        assert!(fooled < caught);
        assert!((fooled + 0.9f64.ln()).abs() < 1e-5);
    }

    #[test]
    fn test_content_loss_is_mean_squared_error() {
        let device = Default::default();
        let a = Tensor::<TestBackend, 4>::zeros([1, 1, 2, 2], &device);
        let b = Tensor::<TestBackend, 4>::from_data(
            TensorData::new(vec![1.0f32, -1.0, 2.0, 0.0], [1, 1, 2, 2]),
            &device,
        );
        // (1 + 1 + 4 + 0) / 4
        assert!((scalar(&content_loss(a, b)) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_total_sums_present_terms() {
        let t = |v: f32| Tensor::<TestBackend, 1>::from_floats([v], &Default::default());
        let loss = GeneratorLoss::new(t(1.0), Some(t(0.5)), t(0.25));
        assert!((scalar(&loss.total) - 1.75).abs() < 1e-6);
        let loss = GeneratorLoss::new(t(1.0), None, t(0.25));
        assert!((scalar(&loss.total) - 1.25).abs() < 1e-6);
    }
}
