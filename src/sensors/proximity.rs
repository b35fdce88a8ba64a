//! VCNL4040 proximity sensor driver.
//!
//! Register map (all registers are 16-bit, little-endian, command-code
//! addressed):
//!
//! | Code | Low byte   | High byte | Use here                          |
//! |------|------------|-----------|-----------------------------------|
//! | 0x03 | PS_CONF1   | PS_CONF2  | duty, integration time, 16-bit    |
//! | 0x04 | PS_CONF3   | PS_MS     | LED current                       |
//! | 0x08 | PS_DATA_L  | PS_DATA_M | proximity count                   |
//! | 0x0C | ID_L       | ID_M      | device id, must read 0x0186       |

use embedded_hal::i2c::I2c;
use log::{debug, info, warn};

use crate::error::SensorError;

/// Fixed 7-bit bus address.
pub const VCNL4040_ADDR: u8 = 0x60;
pub const DEVICE_ID: u16 = 0x0186;

const REG_PS_CONF1_2: u8 = 0x03;
const REG_PS_CONF3_MS: u8 = 0x04;
const REG_PS_DATA: u8 = 0x08;
const REG_ID: u8 = 0x0C;

// PS_CONF1: duty 1/40, persistence 1, IT = 8T, SD cleared (engine on).
const PS_CONF1: u8 = 0b0000_1110;
// PS_CONF2: PS_HD (16-bit output), interrupts off.
const PS_CONF2: u8 = 0b0000_1000;
// PS_CONF3: defaults, no smart persistence, active force off.
const PS_CONF3: u8 = 0x00;
// PS_MS: LED_I = 120 mA.
const PS_MS: u8 = 0b0000_0100;

pub struct Vcnl4040<I2C> {
    i2c: I2C,
    last: u16,
}

impl<I2C: I2c> Vcnl4040<I2C> {
    /// Probe the device, check its identity and start the proximity engine.
    pub fn init(mut i2c: I2C) -> Result<Self, SensorError> {
        let id = read_register(&mut i2c, REG_ID).map_err(|_| SensorError::NotFound)?;
        if id != DEVICE_ID {
            return Err(SensorError::BadId(id));
        }

        write_register(&mut i2c, REG_PS_CONF1_2, PS_CONF1, PS_CONF2)?;
        write_register(&mut i2c, REG_PS_CONF3_MS, PS_CONF3, PS_MS)?;

        info!("VCNL4040: id 0x{id:04X}, proximity engine on (16-bit, IT=8T, 120mA)");
        Ok(Self { i2c, last: 0 })
    }

    /// One proximity count.  A failed transaction is reported, never
    /// replaced with the previous reading.
    pub fn read(&mut self) -> Result<u16, SensorError> {
        match read_register(&mut self.i2c, REG_PS_DATA) {
            Ok(count) => {
                self.last = count;
                Ok(count)
            }
            Err(e) => {
                warn!("VCNL4040: PS read failed: {e}");
                Err(e)
            }
        }
    }

    /// Last successfully read count.
    pub fn last(&self) -> u16 {
        self.last
    }

    /// Put the proximity engine back to sleep and give the bus back.
    pub fn release(mut self) -> I2C {
        if write_register(&mut self.i2c, REG_PS_CONF1_2, PS_CONF1 | 0x01, PS_CONF2).is_err() {
            debug!("VCNL4040: shutdown write failed");
        }
        self.i2c
    }
}

fn read_register<I2C: I2c>(i2c: &mut I2C, reg: u8) -> Result<u16, SensorError> {
    let mut buf = [0u8; 2];
    i2c.write_read(VCNL4040_ADDR, &[reg], &mut buf)
        .map_err(|_| SensorError::Bus)?;
    Ok(u16::from_le_bytes(buf))
}

fn write_register<I2C: I2c>(i2c: &mut I2C, reg: u8, low: u8, high: u8) -> Result<(), SensorError> {
    i2c.write(VCNL4040_ADDR, &[reg, low, high])
        .map_err(|_| SensorError::Bus)
}
