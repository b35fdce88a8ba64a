//! Blink-puff firmware — main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        SerialLineSink      ConsoleRx          │
//! │  (Proximity+Actuator)   (EventSink)         (CommandSource)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Presence · Baseline · Confidence · Blink · Sequencer  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Status LED pattern engine · Task watchdog · Safe halt         │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::prelude::*;
use log::{error, info};

use blinkpuff::adapters::console;
use blinkpuff::adapters::hardware::{HardwareAdapter, PneumaticsOnly};
use blinkpuff::adapters::serial_sink::SerialLineSink;
use blinkpuff::adapters::time::Esp32TimeAdapter;
use blinkpuff::app::service::AppService;
use blinkpuff::clock::elapsed;
use blinkpuff::config::SystemConfig;
use blinkpuff::detection::presence::PresenceState;
use blinkpuff::drivers::hw_init;
use blinkpuff::drivers::led_patterns::LedPatternEngine;
use blinkpuff::drivers::pump::PumpDriver;
use blinkpuff::drivers::status_led::StatusLed;
use blinkpuff::drivers::valve::ValveDriver;
use blinkpuff::drivers::watchdog::{WATCHDOG_TIMEOUT_MS, Watchdog};
use blinkpuff::error::Error;
use blinkpuff::pins;
use blinkpuff::safety::safe_halt;
use blinkpuff::sensors::Vcnl4040;

/// Yield between loop iterations so the idle task (and its watchdog
/// entry) gets to run; the sample gate keeps the 5 ms cadence.
const LOOP_YIELD_MS: u32 = 1;

/// Build-time JSON override applied over the defaults.
fn load_config() -> Result<SystemConfig, Error> {
    match option_env!("BLINKPUFF_CONFIG") {
        Some(json) => {
            let config = SystemConfig::from_json(json)?;
            info!("Config: build-time override applied");
            Ok(config)
        }
        None => {
            let config = SystemConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Blink-puff v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let time = Esp32TimeAdapter::new();
    let mut watchdog = Watchdog::new(WATCHDOG_TIMEOUT_MS);
    let mut led = StatusLed::new();

    // ── 2. Pneumatics off before anything can fail ────────────
    let mut pneumatics = PneumaticsOnly {
        pump: PumpDriver::new(),
        valve: ValveDriver::new(),
    };
    if let Err(e) = hw_init::init_peripherals() {
        error!("HAL init failed: {}", e);
        safe_halt(Error::Init("peripherals"), &mut pneumatics, &mut led, &mut watchdog, || {
            time.uptime_ms()
        });
    }

    // ── 3. Configuration ──────────────────────────────────────
    let config = match load_config() {
        Ok(c) => c,
        Err(e) => safe_halt(e, &mut pneumatics, &mut led, &mut watchdog, || time.uptime_ms()),
    };

    // ── 4. Proximity sensor on I²C0 ───────────────────────────
    // Bus bring-up failure is a sensor init failure: halt, no reboot.
    let peripherals = match Peripherals::take() {
        Ok(p) => p,
        Err(e) => {
            error!("Peripherals already taken: {}", e);
            safe_halt(Error::Init("i2c"), &mut pneumatics, &mut led, &mut watchdog, || {
                time.uptime_ms()
            });
        }
    };
    let i2c_config = I2cConfig::new().baudrate(pins::I2C_FREQ_HZ.Hz());
    // GPIO8 / GPIO9, see pins::I2C_SDA_GPIO and pins::I2C_SCL_GPIO.
    let i2c = match I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8,
        peripherals.pins.gpio9,
        &i2c_config,
    ) {
        Ok(i2c) => i2c,
        Err(e) => {
            error!("I2C0 driver install failed: {}", e);
            safe_halt(Error::Init("i2c"), &mut pneumatics, &mut led, &mut watchdog, || {
                time.uptime_ms()
            });
        }
    };
    let sensor = match Vcnl4040::init(i2c) {
        Ok(s) => s,
        Err(e) => safe_halt(e.into(), &mut pneumatics, &mut led, &mut watchdog, || {
            time.uptime_ms()
        }),
    };

    let PneumaticsOnly { pump, valve } = pneumatics;
    let mut hw = HardwareAdapter::new(sensor, pump, valve);

    // ── 5. Host serial link ───────────────────────────────────
    let (mut rx, tx) = console::open()?;
    let mut sink = SerialLineSink::new(tx);

    // ── 6. Application ────────────────────────────────────────
    let seed = hw_init::hw_random_u64();
    let mut app = AppService::new(config, seed, time.uptime_ms());
    let mut led_engine = LedPatternEngine::new();
    let mut last_ms = time.uptime_ms();

    info!("System ready. Entering control loop.");

    // ── 7. Control loop ───────────────────────────────────────
    loop {
        let now_ms = time.uptime_ms();
        app.tick(now_ms, &mut hw, &mut rx, &mut sink);

        led_engine.set_presence(app.presence() == PresenceState::Present);
        led_engine.set_sequence(app.sequence_running());
        led.set_colour(led_engine.tick(elapsed(now_ms, last_ms)));
        last_ms = now_ms;

        watchdog.feed();
        FreeRtos::delay_ms(LOOP_YIELD_MS);
    }
}
