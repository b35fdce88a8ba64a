//! Dual-polarity blink event detector.
//!
//! Works on the z-score stream produced from the baseline estimate.  A blink
//! is a same-polarity excursion beyond `enter_z` sustained for at least
//! `min_dwell_ms`:
//!
//! ```text
//!              |z| >= enter (first sample)
//!   QUIET ─────────────────────────────────▶ BEYOND(polarity, since)
//!     ▲                                        │   │   │
//!     │  z <= exit before min dwell (reject)   │   │   │ other polarity >= enter
//!     ├────────────────────────────────────────┘   │   └──▶ BEYOND(new, now)
//!     │                                            │
//!     │  dwell >= min_dwell  (count, refractory)   │
//!     └────────────────────────────────────────────┘
//! ```
//!
//! Samples before the refractory deadline are ignored entirely so the
//! rising and falling edges of one physical blink are counted once.

use log::{debug, info};

use crate::clock::{deadline_reached, elapsed};
use crate::config::DetectorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Reading rose above the baseline (+1).
    Rise,
    /// Reading dipped below the baseline (−1).
    Dip,
}

impl Polarity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Rise => "rise",
            Self::Dip => "dip",
        }
    }

    pub fn sign(self) -> i8 {
        match self {
            Self::Rise => 1,
            Self::Dip => -1,
        }
    }
}

/// z-scores of one sample against the current baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZScores {
    pub rise: f32,
    pub dip: f32,
}

impl ZScores {
    /// `sigma` must already be floored.
    pub fn compute(raw: u16, mean: f32, sigma: f32) -> Self {
        let deviation = f32::from(raw) - mean;
        Self {
            rise: deviation / sigma,
            dip: -deviation / sigma,
        }
    }

    pub fn for_polarity(&self, polarity: Polarity) -> f32 {
        match polarity {
            Polarity::Rise => self.rise,
            Polarity::Dip => self.dip,
        }
    }

    /// Polarity whose z-score reaches `threshold`, if either does.
    fn beyond(&self, threshold: f32) -> Option<Polarity> {
        if self.rise >= threshold {
            Some(Polarity::Rise)
        } else if self.dip >= threshold {
            Some(Polarity::Dip)
        } else {
            None
        }
    }
}

/// A confirmed blink, with everything the BLINK line reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlinkEvent {
    pub time_ms: u32,
    pub raw: u16,
    pub mean: f32,
    pub sigma: f32,
    pub z: ZScores,
    pub polarity: Polarity,
    pub confidence: f32,
    /// Lifetime blink count including this one.
    pub count: u32,
}

#[derive(Debug, Clone, Copy)]
struct Crossing {
    polarity: Polarity,
    since_ms: u32,
}

pub struct BlinkDetector {
    config: DetectorConfig,
    crossing: Option<Crossing>,
    refractory_until: Option<u32>,
    count: u32,
}

/// Per-sample inputs to the detector.
#[derive(Debug, Clone, Copy)]
pub struct DetectorInput {
    pub now_ms: u32,
    pub raw: u16,
    pub mean: f32,
    pub sigma: f32,
    pub confidence: f32,
}

impl BlinkDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            crossing: None,
            refractory_until: None,
            count: 0,
        }
    }

    /// Clear crossing and refractory state.  The lifetime count survives.
    pub fn reset(&mut self) {
        self.crossing = None;
        self.refractory_until = None;
    }

    /// Process one gated sample.  The caller only invokes this once the
    /// confidence gate passes.
    pub fn update(&mut self, input: &DetectorInput) -> Option<BlinkEvent> {
        let now = input.now_ms;

        if let Some(until) = self.refractory_until {
            if !deadline_reached(now, until) {
                self.crossing = None;
                return None;
            }
            self.refractory_until = None;
        }

        let z = ZScores::compute(input.raw, input.mean, input.sigma);
        let candidate = z.beyond(self.config.enter_z);

        let Some(crossing) = self.crossing else {
            if let Some(polarity) = candidate {
                debug!("BLINK: crossing start {} at {}ms", polarity.label(), now);
                self.crossing = Some(Crossing {
                    polarity,
                    since_ms: now,
                });
            }
            return None;
        };

        if let Some(polarity) = candidate.filter(|p| *p != crossing.polarity) {
            debug!("BLINK: polarity flip to {} at {}ms", polarity.label(), now);
            self.crossing = Some(Crossing {
                polarity,
                since_ms: now,
            });
            return None;
        }

        let dwell = elapsed(now, crossing.since_ms);
        if dwell < self.config.min_dwell_ms {
            if z.for_polarity(crossing.polarity) <= self.config.exit_z {
                debug!(
                    "BLINK: released {} after {}ms (too short)",
                    crossing.polarity.label(),
                    dwell
                );
                self.crossing = None;
            }
            return None;
        }

        self.count = self.count.wrapping_add(1);
        self.refractory_until = Some(now.wrapping_add(self.config.refractory_ms));
        self.crossing = None;

        let event = BlinkEvent {
            time_ms: now,
            raw: input.raw,
            mean: input.mean,
            sigma: input.sigma,
            z,
            polarity: crossing.polarity,
            confidence: input.confidence,
            count: self.count,
        };
        info!(
            "BLINK: #{} {} zRise={:.2} zDrop={:.2}",
            event.count,
            event.polarity.label(),
            z.rise,
            z.dip
        );
        Some(event)
    }

    /// Drop a crossing being timed.  Used while detection is gated off, so
    /// a crossing never spans samples the detector did not see.
    pub fn abandon_crossing(&mut self) {
        if let Some(c) = self.crossing.take() {
            debug!("BLINK: crossing {} abandoned (gated)", c.polarity.label());
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Whether a crossing is currently being timed.
    pub fn is_beyond(&self) -> bool {
        self.crossing.is_some()
    }

    /// Polarity of the crossing being timed, as +1 / −1 / 0.
    pub fn polarity_sign(&self) -> i8 {
        self.crossing.map_or(0, |c| c.polarity.sign())
    }

    pub fn in_refractory(&self, now_ms: u32) -> bool {
        self.refractory_until
            .is_some_and(|until| !deadline_reached(now_ms, until))
    }
}
