//! System configuration parameters
//!
//! All tunable parameters for the blink-puff rig, grouped per pipeline stage.
//! Defaults are the reference rig values. A build-time JSON override can be
//! applied with [`SystemConfig::from_json`]; every value passes
//! [`SystemConfig::validate`] before the loop may actuate anything.

use serde::{Deserialize, Serialize};

use crate::scheduler::{FRAME_COUNT, SLOTS_PER_FRAME};

/// Maximum pump PWM duty (10-bit LEDC resolution).
pub const PUMP_DUTY_MAX: u16 = 1023;

/// Core system configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub sampling: SamplingConfig,
    pub presence: PresenceConfig,
    pub baseline: BaselineConfig,
    pub confidence: ConfidenceConfig,
    pub detector: DetectorConfig,
    pub actuator: ActuatorConfig,
    pub sequence: SequenceConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Proximity read interval (milliseconds)
    pub interval_ms: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { interval_ms: 5 }
    }
}

/// Hysteresis thresholds for wearer presence (raw counts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    pub enter_threshold: u16,
    pub enter_hold_ms: u32,
    pub exit_threshold: u16,
    /// Longer than the enter hold so a deep blink dip does not drop presence.
    pub exit_hold_ms: u32,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            enter_threshold: 10,
            enter_hold_ms: 40,
            exit_threshold: 5,
            exit_hold_ms: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Time constant of the mean / second-moment EWMA (seconds)
    pub tau_secs: f32,
    /// Time constant of the baseline slope EWMA (seconds)
    pub slope_tau_secs: f32,
    /// Lower bound on sigma used for z-scores
    pub min_sigma: f32,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            tau_secs: 1.0,
            slope_tau_secs: 0.3,
            min_sigma: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub warmup_ms: u32,
    pub min_samples: u32,
    /// Baseline slope (counts per sample) at which stability reaches zero
    pub max_slope: f32,
    /// Detection is suppressed below this confidence
    pub required: f32,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            warmup_ms: 600,
            min_samples: 120,
            max_slope: 0.20,
            required: 0.70,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// z-score that starts a crossing (sigma units)
    pub enter_z: f32,
    /// z-score at or below which an unconfirmed crossing is released
    pub exit_z: f32,
    pub min_dwell_ms: u32,
    pub refractory_ms: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            enter_z: 2.0,
            exit_z: 1.0,
            min_dwell_ms: 20,
            refractory_ms: 250,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    /// Pump duty while precharging / puffing (0..=PUMP_DUTY_MAX)
    pub run_duty: u16,
    /// Pump duty at rest
    pub idle_duty: u16,
    pub precharge_ms: u32,
    pub puff_ms: u32,
    /// Eyelid / mechanical recovery dwell after each puff
    pub guard_ms: u32,
    pub ramp_up_ms: u32,
    pub ramp_down_ms: u32,
    /// Cycle puffs continuously when no sequence is running (bench mode)
    pub free_run: bool,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            run_duty: 1000,
            idle_duty: 0,
            precharge_ms: 220,
            puff_ms: 50,
            guard_ms: 350,
            ramp_up_ms: 120,
            ramp_down_ms: 150,
            free_run: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub slot_ms: u32,
    pub lead_ms: u32,
}

impl SequenceConfig {
    pub fn frame_ms(&self) -> u32 {
        self.slot_ms.saturating_mul(u32::from(SLOTS_PER_FRAME))
    }
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            slot_ms: 400,
            lead_ms: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Emit `t=<ms> ms | prox=<count>` lines
    pub raw_samples: bool,
    pub raw_interval_ms: u32,
    pub status_interval_ms: u32,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            raw_samples: false,
            raw_interval_ms: 10,
            status_interval_ms: 1000,
        }
    }
}

/// Reasons a configuration is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Override text is not valid JSON for [`SystemConfig`].
    Parse,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Parse => write!(f, "config parse error"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Parse => Self::Config("override is not valid JSON"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}

impl SystemConfig {
    /// Parse a (possibly partial) JSON override and validate the result.
    /// Missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|_| ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject incoherent values instead of clamping them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        use ConfigError::ValidationFailed as Invalid;

        if self.sampling.interval_ms == 0 {
            return Err(Invalid("sampling.interval_ms must be non-zero"));
        }

        let p = &self.presence;
        if p.enter_threshold <= p.exit_threshold {
            return Err(Invalid("presence.enter_threshold must exceed exit_threshold"));
        }

        let b = &self.baseline;
        let dt = self.sample_interval_secs();
        if !(b.tau_secs > 0.0 && dt / b.tau_secs <= 1.0) {
            return Err(Invalid("baseline.tau_secs must be >= the sample interval"));
        }
        if !(b.slope_tau_secs > 0.0 && dt / b.slope_tau_secs <= 1.0) {
            return Err(Invalid("baseline.slope_tau_secs must be >= the sample interval"));
        }
        if !(b.min_sigma > 0.0) {
            return Err(Invalid("baseline.min_sigma must be positive"));
        }

        let c = &self.confidence;
        if c.warmup_ms == 0 || c.min_samples == 0 {
            return Err(Invalid("confidence warmup and min_samples must be non-zero"));
        }
        if !(c.max_slope > 0.0) {
            return Err(Invalid("confidence.max_slope must be positive"));
        }
        if !(0.0..=1.0).contains(&c.required) {
            return Err(Invalid("confidence.required must lie in [0, 1]"));
        }

        let d = &self.detector;
        if !(d.enter_z > d.exit_z) {
            return Err(Invalid("detector.enter_z must exceed exit_z"));
        }

        let a = &self.actuator;
        if a.run_duty > PUMP_DUTY_MAX || a.idle_duty > PUMP_DUTY_MAX {
            return Err(Invalid("actuator duty exceeds PWM range"));
        }
        if a.idle_duty >= a.run_duty {
            return Err(Invalid("actuator.run_duty must exceed idle_duty"));
        }
        if a.puff_ms == 0 || a.guard_ms == 0 {
            return Err(Invalid("actuator puff_ms and guard_ms must be non-zero"));
        }

        let s = &self.sequence;
        if s.slot_ms == 0 {
            return Err(Invalid("sequence.slot_ms must be non-zero"));
        }
        if a.puff_ms.saturating_add(a.guard_ms) > s.frame_ms() {
            return Err(Invalid("puff + guard must fit inside one frame"));
        }
        let total = u64::from(s.lead_ms) + u64::from(s.frame_ms()) * FRAME_COUNT as u64;
        if total > u64::from(u32::MAX / 2) {
            return Err(Invalid("sequence span exceeds the wrap-safe clock window"));
        }

        let t = &self.telemetry;
        if t.raw_interval_ms == 0 || t.status_interval_ms == 0 {
            return Err(Invalid("telemetry intervals must be non-zero"));
        }

        Ok(())
    }

    /// Sample interval in seconds (EWMA step size).
    pub fn sample_interval_secs(&self) -> f32 {
        self.sampling.interval_ms as f32 / 1000.0
    }
}
