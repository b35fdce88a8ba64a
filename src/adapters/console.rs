//! Host serial console (UART0).
//!
//! [`open`] splits the UART into a receive half implementing
//! [`CommandSource`] and a transmit half implementing `std::io::Write`, so
//! the control loop can poll commands while a
//! [`SerialLineSink`](super::serial_sink::SerialLineSink) owns the output.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: installs the UART driver with raw sys calls and reads with a
//! zero-tick timeout so the control loop never blocks on the host.
//! On host/test: an in-memory RX queue and TX buffer.

#[cfg(not(target_os = "espidf"))]
use std::collections::VecDeque;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::app::ports::CommandSource;
#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(target_os = "espidf")]
const UART_PORT: i32 = 0;
#[cfg(target_os = "espidf")]
const UART_RX_BUF: i32 = 256;
#[cfg(target_os = "espidf")]
const UART_TX_BUF: i32 = 1024;

/// Errors while bringing up the console UART.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleError {
    DriverInstall(i32),
    ParamConfig(i32),
    SetPin(i32),
}

impl core::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DriverInstall(rc) => write!(f, "UART driver install failed (rc={})", rc),
            Self::ParamConfig(rc) => write!(f, "UART param config failed (rc={})", rc),
            Self::SetPin(rc) => write!(f, "UART pin config failed (rc={})", rc),
        }
    }
}

impl std::error::Error for ConsoleError {}

/// Receive half: inbound command bytes.
pub struct ConsoleRx {
    #[cfg(not(target_os = "espidf"))]
    rx: VecDeque<u8>,
}

/// Transmit half: outbound protocol lines.
pub struct ConsoleTx {
    #[cfg(not(target_os = "espidf"))]
    tx: Vec<u8>,
}

/// Bring up the console UART and split it into its two directions.
#[cfg(target_os = "espidf")]
pub fn open() -> Result<(ConsoleRx, ConsoleTx), ConsoleError> {
    // SAFETY: called once from main() before the loop; the config
    // struct outlives each call.
    unsafe {
        let cfg = uart_config_t {
            baud_rate: pins::UART_BAUD as i32,
            data_bits: uart_word_length_t_UART_DATA_8_BITS,
            parity: uart_parity_t_UART_PARITY_DISABLE,
            stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
            flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
            ..Default::default()
        };
        let ret = uart_driver_install(
            UART_PORT,
            UART_RX_BUF,
            UART_TX_BUF,
            0,
            core::ptr::null_mut(),
            0,
        );
        if ret != ESP_OK as i32 {
            return Err(ConsoleError::DriverInstall(ret));
        }
        let ret = uart_param_config(UART_PORT, &cfg);
        if ret != ESP_OK as i32 {
            return Err(ConsoleError::ParamConfig(ret));
        }
        let ret = uart_set_pin(
            UART_PORT,
            pins::UART_TX_GPIO,
            pins::UART_RX_GPIO,
            UART_PIN_NO_CHANGE,
            UART_PIN_NO_CHANGE,
        );
        if ret != ESP_OK as i32 {
            return Err(ConsoleError::SetPin(ret));
        }
    }
    log::info!("Console: UART{} at {} baud", UART_PORT, pins::UART_BAUD);
    Ok((ConsoleRx {}, ConsoleTx {}))
}

#[cfg(not(target_os = "espidf"))]
pub fn open() -> Result<(ConsoleRx, ConsoleTx), ConsoleError> {
    Ok((ConsoleRx { rx: VecDeque::new() }, ConsoleTx { tx: Vec::new() }))
}

#[cfg(not(target_os = "espidf"))]
impl ConsoleRx {
    /// Queue bytes as if the host had sent them.
    pub fn inject(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }
}

#[cfg(not(target_os = "espidf"))]
impl ConsoleTx {
    /// Drain everything written so far.
    pub fn take_output(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.tx)
    }
}

impl CommandSource for ConsoleRx {
    #[cfg(target_os = "espidf")]
    fn read_byte(&mut self) -> Option<u8> {
        let mut byte = 0u8;
        // SAFETY: one-byte buffer on the stack, zero-tick timeout.
        let n = unsafe { uart_read_bytes(UART_PORT, (&mut byte as *mut u8).cast(), 1, 0) };
        (n == 1).then_some(byte)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }
}

impl std::io::Write for ConsoleTx {
    #[cfg(target_os = "espidf")]
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        // SAFETY: `buf` is valid for `buf.len()` bytes for the whole call.
        let n = unsafe { uart_write_bytes(UART_PORT, buf.as_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(std::io::Error::other("uart_write_bytes failed"));
        }
        Ok(n as usize)
    }

    #[cfg(not(target_os = "espidf"))]
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
