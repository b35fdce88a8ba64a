//! Adaptive baseline estimator.
//!
//! Exponentially weighted mean and second moment of the raw proximity
//! count, plus an EWMA of the absolute step of the mean itself (how fast the
//! baseline is drifting).  Re-seeded from the first sample after every
//! presence transition.

use crate::config::BaselineConfig;

#[derive(Debug, Clone, Copy)]
pub struct BaselineEstimator {
    alpha: f32,
    slope_alpha: f32,
    min_sigma: f32,
    initialized: bool,
    mean: f32,
    second_moment: f32,
    prev_mean: f32,
    slope_ewma: f32,
}

/// Snapshot of the estimate after one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineEstimate {
    pub mean: f32,
    /// Floored standard deviation; z-scores divide by this.
    pub sigma: f32,
    pub slope_ewma: f32,
}

impl BaselineEstimator {
    /// `sample_interval_secs` sets the EWMA step: α = dt / τ.
    pub fn new(config: &BaselineConfig, sample_interval_secs: f32) -> Self {
        Self {
            alpha: (sample_interval_secs / config.tau_secs).clamp(0.0, 1.0),
            slope_alpha: (sample_interval_secs / config.slope_tau_secs).clamp(0.0, 1.0),
            min_sigma: config.min_sigma,
            initialized: false,
            mean: 0.0,
            second_moment: 0.0,
            prev_mean: 0.0,
            slope_ewma: 0.0,
        }
    }

    /// Forget everything; the next sample re-seeds the estimate.
    pub fn reset(&mut self) {
        self.initialized = false;
        self.mean = 0.0;
        self.second_moment = 0.0;
        self.prev_mean = 0.0;
        self.slope_ewma = 0.0;
    }

    pub fn update(&mut self, raw: u16) -> BaselineEstimate {
        let x = f32::from(raw);

        if self.initialized {
            self.prev_mean = self.mean;
            self.mean += self.alpha * (x - self.mean);
            self.second_moment += self.alpha * (x * x - self.second_moment);
            let step = (self.mean - self.prev_mean).abs();
            self.slope_ewma += self.slope_alpha * (step - self.slope_ewma);
        } else {
            self.mean = x;
            self.second_moment = x * x;
            self.prev_mean = x;
            self.slope_ewma = 0.0;
            self.initialized = true;
        }

        self.estimate()
    }

    pub fn estimate(&self) -> BaselineEstimate {
        BaselineEstimate {
            mean: self.mean,
            sigma: self.sigma(),
            slope_ewma: self.slope_ewma,
        }
    }

    /// Raw variance, clamped against negative floating-point drift.
    pub fn variance(&self) -> f32 {
        (self.second_moment - self.mean * self.mean).max(0.0)
    }

    /// Standard deviation floored at the configured minimum.
    pub fn sigma(&self) -> f32 {
        self.variance().sqrt().max(self.min_sigma)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn mean(&self) -> f32 {
        self.mean
    }

    pub fn slope_ewma(&self) -> f32 {
        self.slope_ewma
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> BaselineEstimator {
        BaselineEstimator::new(&BaselineConfig::default(), 0.005)
    }

    #[test]
    fn first_sample_seeds_mean() {
        let mut b = estimator();
        assert!(!b.is_initialized());
        let e = b.update(200);
        assert!(b.is_initialized());
        assert_eq!(e.mean, 200.0);
        assert_eq!(e.slope_ewma, 0.0);
        assert_eq!(b.variance(), 0.0);
    }

    #[test]
    fn flat_signal_uses_sigma_floor() {
        let mut b = estimator();
        for _ in 0..1000 {
            b.update(512);
        }
        assert_eq!(b.sigma(), 0.8);
        assert_eq!(b.estimate().mean, 512.0);
    }

    #[test]
    fn mean_tracks_step_with_time_constant() {
        let mut b = estimator();
        b.update(100);
        // 200 samples at 5 ms = 1 s = one time constant → ~63 % of the step.
        for _ in 0..200 {
            b.update(200);
        }
        let m = b.mean();
        assert!(m > 160.0 && m < 166.0, "mean after one tau: {m}");
        assert!(b.sigma() > 0.8);
    }

    #[test]
    fn slope_reflects_drift_then_settles() {
        let mut b = estimator();
        b.update(100);
        for _ in 0..50 {
            b.update(300);
        }
        let drifting = b.slope_ewma();
        assert!(drifting > 0.2, "slope while drifting: {drifting}");
        for _ in 0..3000 {
            b.update(300);
        }
        assert!(b.slope_ewma() < 0.01);
    }

    #[test]
    fn reset_forgets_history() {
        let mut b = estimator();
        for v in [10, 500, 20, 700] {
            b.update(v);
        }
        b.reset();
        assert!(!b.is_initialized());
        assert_eq!(b.update(42).mean, 42.0);
    }
}
