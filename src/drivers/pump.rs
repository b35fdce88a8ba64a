//! Diaphragm pump driver (low-side MOSFET on an LEDC PWM channel).
//!
//! Duty is the raw 10-bit LEDC value, 0..=1023.  Ramping is the
//! sequencer's job; this driver writes whatever it is given.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real PWM via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::config::PUMP_DUTY_MAX;
use crate::drivers::hw_init;

pub struct PumpDriver {
    duty: u16,
}

impl Default for PumpDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl PumpDriver {
    pub fn new() -> Self {
        Self { duty: 0 }
    }

    /// Set the PWM duty, clamped to the LEDC range.  Repeated writes of the
    /// same duty are skipped.
    pub fn set_duty(&mut self, duty: u16) {
        let duty = duty.min(PUMP_DUTY_MAX);
        if duty == self.duty {
            return;
        }
        hw_init::ledc_set(hw_init::LEDC_CH_PUMP, u32::from(duty));
        self.duty = duty;
    }

    pub fn stop(&mut self) {
        hw_init::ledc_set(hw_init::LEDC_CH_PUMP, 0);
        self.duty = 0;
    }

    pub fn is_running(&self) -> bool {
        self.duty > 0
    }

    pub fn current_duty(&self) -> u16 {
        self.duty
    }
}
