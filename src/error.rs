//! Unified error types for the blink-puff firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! boot path's error handling uniform. All variants are `Copy` so they can
//! be passed through the loop and the safe-halt path without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The proximity sensor could not be reached or identified.
    Sensor(SensorError),
    /// A sequence command could not be honoured.
    Sequence(SequenceError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Sequence(e) => write!(f, "sequence: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// No device acknowledged on the bus.
    NotFound,
    /// A device answered with an unexpected identity.
    BadId(u16),
    /// A transaction with an identified device failed.
    Bus,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "proximity sensor not found"),
            Self::BadId(id) => write!(f, "unexpected device id 0x{id:04X}"),
            Self::Bus => write!(f, "I2C transaction failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Sequence errors
// ---------------------------------------------------------------------------

/// Rejections from the actuator sequencer.  Never fatal: the caller may
/// retry once the sequencer is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceError {
    /// `START` while a sequence is already running.
    AlreadyRunning,
    /// `STOP` with nothing to cancel.
    NotRunning,
}

impl SequenceError {
    /// Short reason tag used on the serial protocol.
    pub fn reason(self) -> &'static str {
        match self {
            Self::AlreadyRunning => "busy",
            Self::NotRunning => "idle",
        }
    }
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "sequence already running"),
            Self::NotRunning => write!(f, "no sequence running"),
        }
    }
}

impl From<SequenceError> for Error {
    fn from(e: SequenceError) -> Self {
        Self::Sequence(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
