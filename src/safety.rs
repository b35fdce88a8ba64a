//! Safe halt.
//!
//! Entered when the firmware cannot run safely: the proximity sensor is
//! missing or misidentified, or the configuration failed validation.
//!
//! ## Halt lifecycle
//!
//! 1. Pump duty 0 and valve closed, before anything else.
//! 2. The status LED switches to the rapid red halt pattern.
//! 3. Every iteration the actuators are re-driven off and the task
//!    watchdog is fed, so a deliberate halt is not turned into a
//!    reset-and-retry loop that would pulse the pneumatics on each boot.
//! 4. The reason is logged every [`HALT_LOG_INTERVAL_MS`].
//!
//! There is no way out short of a power cycle.

use log::error;

use crate::app::ports::ActuatorPort;
use crate::clock::Interval;
use crate::drivers::led_patterns::{LedPatternEngine, Rgb};
use crate::drivers::status_led::StatusLed;
use crate::drivers::watchdog::Watchdog;
use crate::error::Error;

pub const HALT_LOG_INTERVAL_MS: u32 = 5_000;
/// Halt loop period.
pub const HALT_STEP_MS: u32 = 20;

/// One iteration of the halt loop, split out of [`safe_halt`] so the
/// behaviour can be exercised on the host.
pub struct HaltLoop {
    reason: Error,
    led: LedPatternEngine,
    log_gate: Interval,
    last_ms: Option<u32>,
}

impl HaltLoop {
    pub fn new(reason: Error) -> Self {
        let mut led = LedPatternEngine::new();
        led.clear_all();
        led.set_halt(true);
        Self {
            reason,
            led,
            log_gate: Interval::new(HALT_LOG_INTERVAL_MS),
            last_ms: None,
        }
    }

    pub fn reason(&self) -> Error {
        self.reason
    }

    /// Force outputs off, log when due, and return the LED colour.
    pub fn step(&mut self, now_ms: u32, actuators: &mut impl ActuatorPort) -> Rgb {
        actuators.all_off();
        if self.log_gate.due(now_ms) {
            error!("HALT: {} (power cycle to recover)", self.reason);
        }
        let delta = self
            .last_ms
            .map_or(0, |last| crate::clock::elapsed(now_ms, last));
        self.last_ms = Some(now_ms);
        self.led.tick(delta)
    }
}

/// Never returns.  `now_ms` supplies the loop clock.
pub fn safe_halt(
    reason: Error,
    actuators: &mut impl ActuatorPort,
    led: &mut StatusLed,
    watchdog: &mut Watchdog,
    now_ms: impl Fn() -> u32,
) -> ! {
    error!("HALT: entering safe halt: {}", reason);
    actuators.all_off();

    let mut halt = HaltLoop::new(reason);
    loop {
        let colour = halt.step(now_ms(), actuators);
        led.set_colour(colour);
        watchdog.feed();

        #[cfg(target_os = "espidf")]
        esp_idf_svc::hal::delay::FreeRtos::delay_ms(HALT_STEP_MS);
        #[cfg(not(target_os = "espidf"))]
        std::thread::sleep(std::time::Duration::from_millis(u64::from(HALT_STEP_MS)));
    }
}
