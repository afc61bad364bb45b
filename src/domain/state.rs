// ============================================================
// Layer 3 — Training State
// ============================================================
// Counters owned by the orchestrator thread.
//
//   iteration — images consumed in the current epoch; reset at
//               every epoch boundary. Validation and checkpoint
//               intervals are measured against it.
//   epoch     — 1-based index of the running epoch.
//   early_stop — set once an interrupt is observed.
//
// The improvement baseline lives in ImprovementTracker and
// survives epoch boundaries; it is only reset at run start.

/// Relative loss decrease between consecutive logged losses, in percent.
///
/// The first observation only seeds the baseline and reports nothing.
#[derive(Debug, Clone, Default)]
pub struct ImprovementTracker {
    previous: Option<f64>,
}

impl ImprovementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `loss` and return the improvement over the previous one.
    pub fn observe(&mut self, loss: f64) -> Option<f64> {
        let improvement = self
            .previous
            .map(|prev| (prev - loss) / prev * 100.0);
        self.previous = Some(loss);
        improvement
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrainingState {
    pub iteration:   usize,
    pub epoch:       usize,
    pub early_stop:  bool,
    pub improvement: ImprovementTracker,
}

impl TrainingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_epoch(&mut self, epoch: usize) {
        self.epoch     = epoch;
        self.iteration = 0;
    }

    pub fn advance(&mut self, images: usize) {
        self.iteration += images;
    }

    /// True when `iteration` sits on a non-zero multiple of `interval`.
    pub fn at_interval(&self, interval: usize) -> bool {
        interval > 0 && self.iteration != 0 && self.iteration % interval == 0
    }

    pub fn budget_reached(&self, nb_images: usize) -> bool {
        self.iteration >= nb_images
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_improvement_sequence() {
        let mut t = ImprovementTracker::new();
        let reported: Vec<Option<f64>> = [10.0, 8.0, 8.0, 4.0]
            .iter()
            .map(|&l| t.observe(l))
            .collect();

        assert_eq!(reported[0], None);
        assert!((reported[1].unwrap() - 20.0).abs() < 1e-9);
        assert!((reported[2].unwrap() - 0.0).abs() < 1e-9);
        assert!((reported[3].unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_iteration_resets_per_epoch() {
        let mut s = TrainingState::new();
        s.begin_epoch(1);
        s.advance(16);
        s.advance(16);
        assert_eq!(s.iteration, 32);
        s.begin_epoch(2);
        assert_eq!(s.iteration, 0);
        assert_eq!(s.epoch, 2);
    }

    #[test]
    fn test_interval_skips_zero() {
        let mut s = TrainingState::new();
        assert!(!s.at_interval(50));
        s.advance(50);
        assert!(s.at_interval(50));
        s.advance(1);
        assert!(!s.at_interval(50));
    }

    #[test]
    fn test_budget() {
        let mut s = TrainingState::new();
        s.advance(7);
        assert!(!s.budget_reached(8));
        s.advance(1);
        assert!(s.budget_reached(8));
    }
}
