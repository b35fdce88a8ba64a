//! Fuzz target: `SystemConfig::from_json`
//!
//! Arbitrary override text must either be rejected or produce a
//! configuration that passes validation; it must never panic.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use blinkpuff::config::SystemConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = SystemConfig::from_json(text) {
        assert!(config.validate().is_ok());
        assert!(config.sequence.frame_ms() > 0);
    }
});
