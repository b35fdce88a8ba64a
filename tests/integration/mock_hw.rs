//! Mock hardware adapter for integration tests.
//!
//! Records every actuator change so tests can assert on the full command
//! history, captures every protocol line through the real
//! [`SerialLineSink`], and drives the [`AppService`] on a simulated clock.

use std::collections::VecDeque;

use blinkpuff::adapters::serial_sink::SerialLineSink;
use blinkpuff::app::events::AppEvent;
use blinkpuff::app::ports::{ActuatorPort, CommandSource, EventSink, ProximityPort};
use blinkpuff::app::service::AppService;
use blinkpuff::config::SystemConfig;
use blinkpuff::error::SensorError;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Pump { at_ms: u32, duty: u16 },
    Valve { at_ms: u32, open: bool },
    AllOff,
}

// ── MockRig ───────────────────────────────────────────────────

/// Proximity sensor plus pneumatics.  `prox` is what the next read
/// returns; writes that do not change an output are not recorded.
pub struct MockRig {
    pub prox: u16,
    pub fail_reads: bool,
    pub duty: u16,
    pub valve: bool,
    pub now_ms: u32,
    pub calls: Vec<ActuatorCall>,
    pub reads: u32,
}

#[allow(dead_code)]
impl MockRig {
    pub fn new() -> Self {
        Self {
            prox: 0,
            fail_reads: false,
            duty: 0,
            valve: false,
            now_ms: 0,
            calls: Vec::new(),
            reads: 0,
        }
    }

    /// Times at which the valve opened.
    pub fn valve_openings(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::Valve { at_ms, open: true } => Some(*at_ms),
                _ => None,
            })
            .collect()
    }

    pub fn pump_history(&self) -> Vec<(u32, u16)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::Pump { at_ms, duty } => Some((*at_ms, *duty)),
                _ => None,
            })
            .collect()
    }
}

impl Default for MockRig {
    fn default() -> Self {
        Self::new()
    }
}

impl ProximityPort for MockRig {
    fn read_proximity(&mut self) -> Result<u16, SensorError> {
        self.reads += 1;
        if self.fail_reads {
            Err(SensorError::Bus)
        } else {
            Ok(self.prox)
        }
    }
}

impl ActuatorPort for MockRig {
    fn set_pump_duty(&mut self, duty: u16) {
        if duty != self.duty {
            self.duty = duty;
            self.calls.push(ActuatorCall::Pump {
                at_ms: self.now_ms,
                duty,
            });
        }
    }

    fn set_valve(&mut self, open: bool) {
        if open != self.valve {
            self.valve = open;
            self.calls.push(ActuatorCall::Valve {
                at_ms: self.now_ms,
                open,
            });
        }
    }

    fn all_off(&mut self) {
        self.duty = 0;
        self.valve = false;
        self.calls.push(ActuatorCall::AllOff);
    }
}

// ── Host link ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockInput {
    bytes: VecDeque<u8>,
}

impl MockInput {
    pub fn send(&mut self, text: &str) {
        self.bytes.extend(text.as_bytes());
    }
}

impl CommandSource for MockInput {
    fn read_byte(&mut self) -> Option<u8> {
        self.bytes.pop_front()
    }
}

/// Keeps every event and forwards it to a real serial sink writing into
/// memory, so tests see exactly the bytes the host would.
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
    serial: SerialLineSink<Vec<u8>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            serial: SerialLineSink::new(Vec::new()),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(self.serial.get_ref())
            .lines()
            .map(str::to_owned)
            .collect()
    }

    /// Exact bytes written to the host link.
    pub fn wire(&self) -> &[u8] {
        self.serial.get_ref()
    }

    pub fn lines_starting(&self, prefix: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.starts_with(prefix))
            .collect()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
        self.serial.emit(event);
    }
}

// ── Bench: service + mocks on a simulated clock ───────────────

pub struct Bench {
    pub app: AppService,
    pub rig: MockRig,
    pub input: MockInput,
    pub sink: RecordingSink,
    pub now_ms: u32,
}

#[allow(dead_code)]
impl Bench {
    pub fn new(config: SystemConfig) -> Self {
        Self::with_seed(config, 0xB1_1C)
    }

    pub fn with_seed(config: SystemConfig, seed: u64) -> Self {
        Self {
            app: AppService::new(config, seed, 0),
            rig: MockRig::new(),
            input: MockInput::default(),
            sink: RecordingSink::new(),
            now_ms: 0,
        }
    }

    pub fn tick(&mut self) {
        self.rig.now_ms = self.now_ms;
        self.app
            .tick(self.now_ms, &mut self.rig, &mut self.input, &mut self.sink);
    }

    /// Tick every `step_ms` until `duration_ms` has passed.
    pub fn run_for(&mut self, duration_ms: u32, step_ms: u32) {
        let end = self.now_ms + duration_ms;
        while self.now_ms < end {
            self.tick();
            self.now_ms += step_ms;
        }
    }

    /// Hold the sensor at `prox` for `duration_ms` of 1 ms ticks.
    pub fn hold(&mut self, prox: u16, duration_ms: u32) {
        self.rig.prox = prox;
        self.run_for(duration_ms, 1);
    }

    pub fn command(&mut self, line: &str) {
        self.input.send(line);
        self.tick();
    }
}
