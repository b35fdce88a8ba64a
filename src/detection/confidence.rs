//! Detection confidence gate.
//!
//! Three sub-scores, each clamped to [0, 1]:
//!
//! | Component | Score                                   |
//! |-----------|-----------------------------------------|
//! | time      | elapsed since presence entry / warm-up  |
//! | samples   | samples since presence entry / minimum  |
//! | stability | 1 − slope EWMA / max slope              |
//!
//! The combined confidence is the minimum: every condition must hold.

use crate::clock::elapsed;
use crate::config::ConfidenceConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confidence {
    pub time: f32,
    pub samples: f32,
    pub stability: f32,
}

impl Confidence {
    pub const ZERO: Self = Self {
        time: 0.0,
        samples: 0.0,
        stability: 0.0,
    };

    pub fn combined(&self) -> f32 {
        self.time.min(self.samples).min(self.stability)
    }
}

pub struct ConfidenceGate {
    config: ConfidenceConfig,
    entered_ms: u32,
    samples_seen: u32,
    last: Confidence,
}

impl ConfidenceGate {
    pub fn new(config: ConfidenceConfig) -> Self {
        Self {
            config,
            entered_ms: 0,
            samples_seen: 0,
            last: Confidence::ZERO,
        }
    }

    /// Start a fresh warm-up anchored at the presence entry time.
    pub fn reset(&mut self, entered_ms: u32) {
        self.entered_ms = entered_ms;
        self.samples_seen = 0;
        self.last = Confidence::ZERO;
    }

    /// Score one sample taken while present.
    pub fn update(&mut self, now_ms: u32, slope_ewma: f32) -> f32 {
        self.samples_seen = self.samples_seen.saturating_add(1);
        let c = &self.config;
        self.last = Confidence {
            time: unit(elapsed(now_ms, self.entered_ms) as f32 / c.warmup_ms as f32),
            samples: unit(self.samples_seen as f32 / c.min_samples as f32),
            stability: unit(1.0 - slope_ewma / c.max_slope),
        };
        self.last.combined()
    }

    pub fn last(&self) -> Confidence {
        self.last
    }

    pub fn value(&self) -> f32 {
        self.last.combined()
    }

    pub fn passes(&self) -> bool {
        self.value() >= self.config.required
    }

    pub fn required(&self) -> f32 {
        self.config.required
    }

    pub fn samples_seen(&self) -> u32 {
        self.samples_seen
    }
}

fn unit(x: f32) -> f32 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> ConfidenceGate {
        let mut g = ConfidenceGate::new(ConfidenceConfig::default());
        g.reset(1000);
        g
    }

    #[test]
    fn starts_at_zero() {
        let g = gate();
        assert_eq!(g.value(), 0.0);
        assert!(!g.passes());
    }

    #[test]
    fn sample_count_limits_early_confidence() {
        let mut g = gate();
        // Time is already saturated but only one sample has been seen.
        let c = g.update(5000, 0.0);
        assert!((c - 1.0 / 120.0).abs() < 1e-6);
        assert_eq!(g.last().time, 1.0);
    }

    #[test]
    fn time_limits_when_samples_arrive_fast() {
        let mut g = gate();
        for i in 0..200 {
            g.update(1000 + i, 0.0);
        }
        // 199 ms of a 600 ms warm-up.
        assert!((g.value() - 199.0 / 600.0).abs() < 1e-4);
    }

    #[test]
    fn passes_after_warmup_at_5ms_cadence() {
        let mut g = gate();
        let mut first_pass = None;
        for i in 1..=200u32 {
            g.update(1000 + i * 5, 0.0);
            if g.passes() && first_pass.is_none() {
                first_pass = Some(i);
            }
        }
        // Both time (420 ms) and count (84 samples) cross 0.70 at sample 84.
        assert_eq!(first_pass, Some(84));
    }

    #[test]
    fn unstable_baseline_blocks_detection() {
        let mut g = gate();
        for i in 1..=200u32 {
            g.update(1000 + i * 5, 0.15);
        }
        assert!((g.last().stability - 0.25).abs() < 1e-5);
        assert!(!g.passes());
        g.update(2100, 0.5);
        assert_eq!(g.last().stability, 0.0);
    }
}
