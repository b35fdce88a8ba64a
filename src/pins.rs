//! GPIO / peripheral pin assignments for the blink-puff rig board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Proximity sensor (VCNL4040 on I²C0)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
/// 400 kHz fast mode keeps one PS read well under the 5 ms sample period.
pub const I2C_FREQ_HZ: u32 = 400_000;

// ---------------------------------------------------------------------------
// Pneumatics
// ---------------------------------------------------------------------------

/// LEDC PWM output to the pump MOSFET gate.
pub const PUMP_PWM_GPIO: i32 = 1;
/// Digital output to the solenoid valve driver (HIGH = open).
pub const VALVE_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Status LED (discrete RGB)
// ---------------------------------------------------------------------------

pub const LED_R_GPIO: i32 = 11;
pub const LED_G_GPIO: i32 = 12;
pub const LED_B_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Host serial link
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 43;
pub const UART_RX_GPIO: i32 = 44;
pub const UART_BAUD: u32 = 115_200;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC resolution for the pump (10-bit → duty 0..=1023).
pub const PUMP_PWM_RESOLUTION_BITS: u32 = 10;
/// Pump PWM frequency (20 kHz, above the audible range).
pub const PUMP_PWM_FREQ_HZ: u32 = 20_000;
/// LEDC frequency for the RGB status LED (8-bit).
pub const LED_PWM_FREQ_HZ: u32 = 1_000;
