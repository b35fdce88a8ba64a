//! Actuator drive shaping.

pub mod ramp;

pub use ramp::Ramp;
