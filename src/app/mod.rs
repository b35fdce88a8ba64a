//! Application core — pure domain logic, zero I/O.
//!
//! Blink detection, the puff sequencer and the host command protocol,
//! orchestrated by one cooperative `tick`.  All interaction with hardware
//! happens through the **port traits** defined in [`ports`], keeping this
//! layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
