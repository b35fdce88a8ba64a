//! Blink-puff firmware library.
//!
//! Exposes the pure-logic modules for integration testing and host
//! simulation. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod clock;
pub mod config;
pub mod detection;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod protocol;
pub mod safety;
pub mod scheduler;
pub mod sequencer;

// Hardware-facing modules; each carries an ESP-IDF implementation and a
// host simulation behind cfg attributes.
pub mod adapters;
pub mod control;
pub mod drivers;
pub mod sensors;
