//! Sensor subsystem.
//!
//! The rig has a single sensor: a VCNL4040 proximity sensor looking at the
//! eyelid.  The driver is generic over `embedded_hal::i2c::I2c`, so the
//! firmware hands it the ESP-IDF I²C driver and host tests hand it a mock.

pub mod proximity;

pub use proximity::Vcnl4040;
