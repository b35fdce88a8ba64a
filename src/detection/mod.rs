//! Blink detection pipeline.
//!
//! ```text
//!  raw ──▶ PresenceGate ──▶ BaselineEstimator ──▶ ConfidenceGate ──▶ BlinkDetector ──▶ BlinkEvent
//!              │                   ▲                    ▲                  ▲
//!              └──── transition ───┴──── reset ─────────┴──────────────────┘
//! ```
//!
//! Each stage owns its own state; [`BlinkPipeline`] only sequences them and
//! performs the full re-calibration on every presence transition.

pub mod baseline;
pub mod blink;
pub mod confidence;
pub mod presence;

use baseline::BaselineEstimator;
use blink::{BlinkDetector, BlinkEvent, DetectorInput, ZScores};
use confidence::ConfidenceGate;
use presence::{PresenceGate, PresenceState, PresenceTransition};

use crate::config::SystemConfig;

/// What one sample produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleOutcome {
    pub transition: Option<PresenceTransition>,
    pub blink: Option<BlinkEvent>,
}

/// Baseline-dependent part of a status snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineSnapshot {
    pub mean: f32,
    pub sigma: f32,
    pub z: ZScores,
}

/// Everything a STATUS line reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionSnapshot {
    pub presence: PresenceState,
    pub raw: u16,
    pub confidence: f32,
    pub blinks: u32,
    pub baseline: Option<BaselineSnapshot>,
}

pub struct BlinkPipeline {
    presence: PresenceGate,
    baseline: BaselineEstimator,
    confidence: ConfidenceGate,
    detector: BlinkDetector,
    last_raw: u16,
}

impl BlinkPipeline {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            presence: PresenceGate::new(config.presence.clone()),
            baseline: BaselineEstimator::new(&config.baseline, config.sample_interval_secs()),
            confidence: ConfidenceGate::new(config.confidence.clone()),
            detector: BlinkDetector::new(config.detector.clone()),
            last_raw: 0,
        }
    }

    /// Run one raw sample through every stage.
    pub fn process(&mut self, raw: u16, now_ms: u32) -> SampleOutcome {
        self.last_raw = raw;
        let mut outcome = SampleOutcome {
            transition: self.presence.update(raw, now_ms),
            blink: None,
        };

        if let Some(t) = outcome.transition {
            self.recalibrate(t.at_ms);
        }

        if !self.presence.is_present() {
            return outcome;
        }

        let estimate = self.baseline.update(raw);
        let confidence = self.confidence.update(now_ms, estimate.slope_ewma);
        if self.confidence.passes() {
            outcome.blink = self.detector.update(&DetectorInput {
                now_ms,
                raw,
                mean: estimate.mean,
                sigma: estimate.sigma,
                confidence,
            });
        } else {
            self.detector.abandon_crossing();
        }
        outcome
    }

    /// Fresh calibration for a new wearing session (or for idling).
    fn recalibrate(&mut self, at_ms: u32) {
        self.baseline.reset();
        self.confidence.reset(at_ms);
        self.detector.reset();
    }

    pub fn snapshot(&self) -> DetectionSnapshot {
        let present = self.presence.is_present();
        let baseline = (present && self.baseline.is_initialized()).then(|| {
            let e = self.baseline.estimate();
            BaselineSnapshot {
                mean: e.mean,
                sigma: e.sigma,
                z: ZScores::compute(self.last_raw, e.mean, e.sigma),
            }
        });
        DetectionSnapshot {
            presence: self.presence.state(),
            raw: self.last_raw,
            confidence: if present { self.confidence.value() } else { 0.0 },
            blinks: self.detector.count(),
            baseline,
        }
    }

    pub fn presence(&self) -> PresenceState {
        self.presence.state()
    }

    pub fn blink_count(&self) -> u32 {
        self.detector.count()
    }

    pub fn confidence(&self) -> f32 {
        self.confidence.value()
    }

    pub fn baseline(&self) -> &BaselineEstimator {
        &self.baseline
    }

    pub fn detector(&self) -> &BlinkDetector {
        &self.detector
    }
}
