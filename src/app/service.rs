//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the detection pipeline, the puff sequencer and the
//! command line reader.  One call to [`AppService::tick`] is one iteration
//! of the cooperative control loop:
//!
//! ```text
//!  CommandSource ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!  ProximityPort ──▶ │         AppService          │
//!                    │ commands · sample · detect  │
//!  ActuatorPort  ◀── │ status · ramp · puff FSM    │
//!                    └─────────────────────────────┘
//! ```
//!
//! Ordering inside one tick matters: the sample is consumed by the
//! pipeline in the same iteration it is taken, and the ramp is serviced
//! before the state machine so a transition starts ramping immediately.

use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::clock::Interval;
use crate::config::SystemConfig;
use crate::detection::presence::PresenceState;
use crate::detection::{BlinkPipeline, DetectionSnapshot};
use crate::fsm::StateId;
use crate::protocol::{LineEvent, LineReader};
use crate::sequencer::Sequencer;

use super::commands::HostCommand;
use super::events::AppEvent;
use super::ports::{ActuatorPort, CommandSource, EventSink, ProximityPort};

/// Upper bound on command bytes consumed per iteration.
const MAX_INPUT_BYTES_PER_TICK: usize = 64;

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    config: SystemConfig,
    pipeline: BlinkPipeline,
    sequencer: Sequencer,
    reader: LineReader,
    rng: SmallRng,
    sample_gate: Interval,
    raw_gate: Interval,
    status_gate: Interval,
    sensor_errors: u32,
}

impl AppService {
    /// Build the service.  `seed` drives the random puff slots; the
    /// firmware seeds it from the hardware RNG.
    pub fn new(config: SystemConfig, seed: u64, now_ms: u32) -> Self {
        let pipeline = BlinkPipeline::new(&config);
        let sequencer = Sequencer::new(config.actuator.clone(), config.sequence.clone(), now_ms);
        Self {
            sample_gate: Interval::new(config.sampling.interval_ms),
            raw_gate: Interval::new(config.telemetry.raw_interval_ms),
            status_gate: Interval::new(config.telemetry.status_interval_ms),
            pipeline,
            sequencer,
            reader: LineReader::new(),
            rng: SmallRng::seed_from_u64(seed),
            config,
            sensor_errors: 0,
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one loop iteration at `now_ms`.
    ///
    /// The `hw` parameter satisfies **both** [`ProximityPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        now_ms: u32,
        hw: &mut (impl ProximityPort + ActuatorPort),
        input: &mut impl CommandSource,
        sink: &mut impl EventSink,
    ) {
        // 1. Host commands
        self.poll_commands(now_ms, input, sink);

        // 2–3. Sample and detect
        if self.sample_gate.due(now_ms) {
            self.sample(now_ms, hw, sink);
        }

        // 4. Periodic status
        if self.status_gate.due(now_ms) {
            sink.emit(&AppEvent::Status {
                time_ms: now_ms,
                snapshot: self.pipeline.snapshot(),
            });
        }

        // 5–6. Ramp service, then actuator state evaluation
        let prev = self.sequencer.state();
        if let Some(end) = self.sequencer.tick(now_ms) {
            sink.emit(&AppEvent::SequenceEnded {
                time_ms: end.time_ms,
            });
        }
        let state = self.sequencer.state();
        if state != prev {
            sink.emit(&AppEvent::ActuatorChanged {
                from: prev,
                to: state,
            });
        }

        self.apply_actuators(hw);
    }

    fn poll_commands(&mut self, now_ms: u32, input: &mut impl CommandSource, sink: &mut impl EventSink) {
        for _ in 0..MAX_INPUT_BYTES_PER_TICK {
            let Some(byte) = input.read_byte() else {
                break;
            };
            match self.reader.feed(byte) {
                Some(LineEvent::Command(cmd)) => self.handle_command(cmd, now_ms, sink),
                Some(LineEvent::Unknown) => warn!("CMD: unrecognised line ignored"),
                Some(LineEvent::Overflow) => warn!("CMD: overlong line discarded"),
                None => {}
            }
        }
    }

    fn sample(&mut self, now_ms: u32, hw: &mut impl ProximityPort, sink: &mut impl EventSink) {
        let raw = match hw.read_proximity() {
            Ok(raw) => raw,
            Err(e) => {
                self.sensor_errors = self.sensor_errors.saturating_add(1);
                warn!("SENSOR: read failed ({}), sample skipped", e);
                return;
            }
        };

        let outcome = self.pipeline.process(raw, now_ms);
        if let Some(transition) = outcome.transition {
            sink.emit(&AppEvent::PresenceChanged(transition));
        }
        if let Some(blink) = outcome.blink {
            sink.emit(&AppEvent::Blink(blink));
        }

        if self.config.telemetry.raw_samples && self.raw_gate.due(now_ms) {
            sink.emit(&AppEvent::RawSample {
                time_ms: now_ms,
                prox: raw,
            });
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Act on one host command.
    pub fn handle_command(&mut self, cmd: HostCommand, now_ms: u32, sink: &mut impl EventSink) {
        debug!("CMD: {} at {}ms", cmd.as_str(), now_ms);
        match cmd {
            HostCommand::Start => match self.sequencer.start(now_ms, &mut self.rng) {
                Ok(schedule) => {
                    let event = AppEvent::SequenceStarted {
                        time_ms: now_ms,
                        slots: schedule.slots(),
                        lead_ms: schedule.lead_ms(),
                    };
                    sink.emit(&event);
                }
                Err(reason) => {
                    warn!("CMD: START rejected ({})", reason);
                    sink.emit(&AppEvent::SequenceRejected {
                        time_ms: now_ms,
                        reason,
                    });
                }
            },
            HostCommand::Stop => {
                // STOP while idle is not an error worth a line.
                if self.sequencer.cancel(now_ms).is_ok() {
                    sink.emit(&AppEvent::SequenceCancelled { time_ms: now_ms });
                }
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn snapshot(&self) -> DetectionSnapshot {
        self.pipeline.snapshot()
    }

    pub fn presence(&self) -> PresenceState {
        self.pipeline.presence()
    }

    pub fn blink_count(&self) -> u32 {
        self.pipeline.blink_count()
    }

    /// Current actuator state.
    pub fn state(&self) -> StateId {
        self.sequencer.state()
    }

    pub fn sequence_running(&self) -> bool {
        self.sequencer.is_running()
    }

    pub fn pump_duty(&self) -> u16 {
        self.sequencer.pump_duty()
    }

    pub fn valve_open(&self) -> bool {
        self.sequencer.valve_open()
    }

    /// Proximity reads that failed and were skipped.
    pub fn sensor_errors(&self) -> u32 {
        self.sensor_errors
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn apply_actuators(&self, hw: &mut impl ActuatorPort) {
        hw.set_pump_duty(self.sequencer.pump_duty());
        hw.set_valve(self.sequencer.valve_open());
    }

    /// Drive every actuator to its safe state (used before a halt).
    pub fn shutdown(&self, hw: &mut impl ActuatorPort) {
        info!("APP: actuators off");
        hw.all_off();
    }
}
