//! Solenoid valve driver (single GPIO, HIGH = open).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the valve GPIO via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::pins;

pub struct ValveDriver {
    open: bool,
}

impl Default for ValveDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl ValveDriver {
    pub fn new() -> Self {
        Self { open: false }
    }

    pub fn set_open(&mut self, open: bool) {
        if open == self.open {
            return;
        }
        hw_init::gpio_write(pins::VALVE_GPIO, open);
        self.open = open;
    }

    /// Close unconditionally, even if the cached state says closed.
    pub fn close(&mut self) {
        hw_init::gpio_write(pins::VALVE_GPIO, false);
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}
