//! Property tests for the detection and actuation invariants.
//!
//! Runs on host (x86_64) only — proptest is not available for ESP32 targets.
//! On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use std::collections::VecDeque;

use blinkpuff::app::events::AppEvent;
use blinkpuff::app::ports::{ActuatorPort, CommandSource, EventSink, ProximityPort};
use blinkpuff::app::service::AppService;
use blinkpuff::config::{BaselineConfig, DetectorConfig, SystemConfig};
use blinkpuff::control::Ramp;
use blinkpuff::detection::baseline::BaselineEstimator;
use blinkpuff::detection::blink::{BlinkDetector, DetectorInput};
use blinkpuff::error::SensorError;
use blinkpuff::fsm::StateId;
use proptest::prelude::*;

// ── Minimal rig ───────────────────────────────────────────────

#[derive(Default)]
struct Rig {
    prox: u16,
    duty: u16,
    valve: bool,
}

impl ProximityPort for Rig {
    fn read_proximity(&mut self) -> Result<u16, SensorError> {
        Ok(self.prox)
    }
}

impl ActuatorPort for Rig {
    fn set_pump_duty(&mut self, duty: u16) {
        self.duty = duty;
    }
    fn set_valve(&mut self, open: bool) {
        self.valve = open;
    }
    fn all_off(&mut self) {
        self.duty = 0;
        self.valve = false;
    }
}

#[derive(Default)]
struct Input(VecDeque<u8>);

impl CommandSource for Input {
    fn read_byte(&mut self) -> Option<u8> {
        self.0.pop_front()
    }
}

#[derive(Default)]
struct Events(Vec<AppEvent>);

impl EventSink for Events {
    fn emit(&mut self, event: &AppEvent) {
        self.0.push(event.clone());
    }
}

// ── Baseline: sigma floor ─────────────────────────────────────

proptest! {
    /// Whatever the signal, the sigma fed to z-scores never drops below
    /// the configured floor.
    #[test]
    fn sigma_never_below_floor(
        samples in proptest::collection::vec(any::<u16>(), 1..400),
        flat in any::<bool>(),
    ) {
        let config = BaselineConfig::default();
        let mut b = BaselineEstimator::new(&config, 0.005);
        for (i, raw) in samples.iter().enumerate() {
            let raw = if flat { samples[0] } else { *raw };
            let e = b.update(raw);
            prop_assert!(e.sigma >= config.min_sigma, "sample {}: sigma {}", i, e.sigma);
            prop_assert!(e.sigma.is_finite());
        }
    }
}

// ── Blink detector: refractory and dwell ──────────────────────

fn detector_step(d: &mut BlinkDetector, now_ms: u32, z: f32) -> bool {
    d.update(&DetectorInput {
        now_ms,
        raw: (100.0 + z * 2.0).round().clamp(0.0, 65535.0) as u16,
        mean: 100.0,
        sigma: 2.0,
        confidence: 1.0,
    })
    .is_some()
}

proptest! {
    /// No two confirmed blinks are closer than the refractory period.
    #[test]
    fn blinks_respect_refractory(zs in proptest::collection::vec(-6.0f32..6.0, 1..600)) {
        let config = DetectorConfig::default();
        let mut d = BlinkDetector::new(config.clone());
        let mut last: Option<u32> = None;
        for (i, z) in zs.iter().enumerate() {
            let t = i as u32 * 5;
            if detector_step(&mut d, t, *z) {
                if let Some(prev) = last {
                    prop_assert!(t - prev >= config.refractory_ms, "blinks at {} and {}", prev, t);
                }
                last = Some(t);
            }
        }
    }

    /// Excursions that fall back inside the exit band before the minimum
    /// dwell never count, however many there are.
    #[test]
    fn short_excursions_never_count(
        bursts in proptest::collection::vec((1usize..=3, any::<bool>(), 1usize..10), 1..60),
    ) {
        let mut d = BlinkDetector::new(DetectorConfig::default());
        let mut t = 0u32;
        for (len, rise, calm) in bursts {
            let z = if rise { 3.0 } else { -3.0 };
            // The first calm sample lands at most 15 ms into the 20 ms dwell.
            for _ in 0..len {
                prop_assert!(!detector_step(&mut d, t, z));
                t += 5;
            }
            for _ in 0..calm {
                prop_assert!(!detector_step(&mut d, t, 0.0));
                t += 5;
            }
        }
        prop_assert_eq!(d.count(), 0);
    }
}

// ── Ramp ──────────────────────────────────────────────────────

proptest! {
    /// Output stays between the endpoints, moves only toward the target,
    /// and is exact once the duration has elapsed.
    #[test]
    fn ramp_bounded_monotonic_exact(
        from in 0u16..=1023,
        to in 0u16..=1023,
        duration in 1u32..500,
        start in any::<u32>(),
        steps in proptest::collection::vec(1u32..40, 1..60),
    ) {
        let mut r = Ramp::hold(from);
        r.start(from, to, start, duration);
        let (lo, hi) = (from.min(to), from.max(to));
        let mut prev = from;
        let mut now = start;
        for step in steps {
            now = now.wrapping_add(step);
            let d = r.service(now);
            prop_assert!(d >= lo && d <= hi);
            if to >= from {
                prop_assert!(d >= prev);
            } else {
                prop_assert!(d <= prev);
            }
            if now.wrapping_sub(start) >= duration {
                prop_assert_eq!(d, to);
            }
            prev = d;
        }
    }
}

// ── Full loop: valve invariant and sequence completion ────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Under arbitrary loop jitter a sequence runs exactly 16 puff cycles,
    /// ends once, and the valve is open exactly while in Puff.
    #[test]
    fn sequence_completes_once_under_jitter(
        seed in any::<u64>(),
        jitter in proptest::collection::vec(1u32..=12, 64),
        start_at in any::<u32>(),
    ) {
        let mut app = AppService::new(SystemConfig::default(), seed, start_at);
        let mut rig = Rig { prox: 2, ..Rig::default() };
        let mut input = Input::default();
        let mut events = Events::default();

        input.0.extend(b"START\n");
        let mut now = start_at;
        let mut i = 0;
        let mut puffs = 0;
        let mut cycles = Vec::new();
        let mut prev = app.state();
        // 16 frames of 1.6 s plus the lead time, with margin.
        while now.wrapping_sub(start_at) < 28_000 {
            app.tick(now, &mut rig, &mut input, &mut events);
            let state = app.state();
            prop_assert_eq!(rig.valve, state == StateId::Puff);
            if state != prev {
                cycles.push(state);
                if state == StateId::Puff {
                    puffs += 1;
                }
            }
            prev = state;
            now = now.wrapping_add(jitter[i % jitter.len()]);
            i += 1;
        }

        prop_assert_eq!(puffs, 16);
        let ends = events.0.iter().filter(|e| matches!(e, AppEvent::SequenceEnded { .. })).count();
        prop_assert_eq!(ends, 1);
        let starts = events.0.iter().filter(|e| matches!(e, AppEvent::SequenceStarted { .. })).count();
        prop_assert_eq!(starts, 1);

        // Every cycle walks Precharge → Puff → Recover → Rest in order.
        let expected: Vec<StateId> = [StateId::Precharge, StateId::Puff, StateId::Recover, StateId::Rest]
            .iter()
            .copied()
            .cycle()
            .take(64)
            .collect();
        prop_assert_eq!(cycles, expected);
    }
}
