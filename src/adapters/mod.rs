//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements     | Connects to                   |
//! |---------------|----------------|-------------------------------|
//! | `hardware`    | ProximityPort  | VCNL4040 over I²C             |
//! |               | ActuatorPort   | Pump LEDC PWM, valve GPIO     |
//! | `serial_sink` | EventSink      | Host serial line protocol     |
//! | `console`     | CommandSource  | UART0 RX (non-blocking)       |
//! | `time`        | —              | ESP32 system timer            |

pub mod console;
pub mod hardware;
pub mod serial_sink;
pub mod time;
