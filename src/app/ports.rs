//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (proximity sensor, pump/valve, serial link) implement
//! these traits.  The [`AppService`](super::service::AppService) consumes
//! them via generics, so the domain core never touches hardware directly.

use crate::error::SensorError;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

pub trait ProximityPort {
    /// One bounded bus transaction returning the raw proximity count.
    fn read_proximity(&mut self) -> Result<u16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

pub trait ActuatorPort {
    /// Pump PWM duty, 0..=[`PUMP_DUTY_MAX`](crate::config::PUMP_DUTY_MAX).
    fn set_pump_duty(&mut self, duty: u16);

    fn set_valve(&mut self, open: bool);

    /// Pump off, valve closed.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → serial / logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide how they reach the host.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Command source port (driven adapter: host → domain)
// ───────────────────────────────────────────────────────────────

/// Non-blocking byte source for host commands.
pub trait CommandSource {
    /// Next received byte, or `None` when nothing is pending.
    fn read_byte(&mut self) -> Option<u8>;
}
