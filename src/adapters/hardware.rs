//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the proximity sensor and both pneumatic drivers, exposing them
//! through [`ProximityPort`] and [`ActuatorPort`].  The sensor is generic
//! over the I²C bus so host tests can run the whole adapter against a mock
//! bus; the drivers use cfg-gated simulation stubs off-target.

use embedded_hal::i2c::I2c;

use crate::app::ports::{ActuatorPort, ProximityPort};
use crate::drivers::pump::PumpDriver;
use crate::drivers::valve::ValveDriver;
use crate::error::SensorError;
use crate::sensors::Vcnl4040;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I2C> {
    sensor: Vcnl4040<I2C>,
    pump: PumpDriver,
    valve: ValveDriver,
}

impl<I2C: I2c> HardwareAdapter<I2C> {
    pub fn new(sensor: Vcnl4040<I2C>, pump: PumpDriver, valve: ValveDriver) -> Self {
        Self { sensor, pump, valve }
    }

    pub fn pump(&self) -> &PumpDriver {
        &self.pump
    }

    pub fn valve(&self) -> &ValveDriver {
        &self.valve
    }
}

// ── ProximityPort implementation ──────────────────────────────

impl<I2C: I2c> ProximityPort for HardwareAdapter<I2C> {
    fn read_proximity(&mut self) -> Result<u16, SensorError> {
        self.sensor.read()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<I2C: I2c> ActuatorPort for HardwareAdapter<I2C> {
    fn set_pump_duty(&mut self, duty: u16) {
        self.pump.set_duty(duty);
    }

    fn set_valve(&mut self, open: bool) {
        self.valve.set_open(open);
    }

    fn all_off(&mut self) {
        self.valve.close();
        self.pump.stop();
    }
}

/// Actuators alone, for the safe-halt path where no sensor exists.
pub struct PneumaticsOnly {
    pub pump: PumpDriver,
    pub valve: ValveDriver,
}

impl ActuatorPort for PneumaticsOnly {
    fn set_pump_duty(&mut self, duty: u16) {
        self.pump.set_duty(duty);
    }

    fn set_valve(&mut self, open: bool) {
        self.valve.set_open(open);
    }

    fn all_off(&mut self) {
        self.valve.close();
        self.pump.stop();
    }
}
