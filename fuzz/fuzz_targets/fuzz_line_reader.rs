//! Fuzz target: `LineReader::feed`
//!
//! Drives arbitrary byte sequences into the command line reader and
//! asserts that it never panics, never buffers past its capacity, and
//! always recovers: after any garbage plus a newline, `START\n` parses.
//!
//! cargo fuzz run fuzz_line_reader

#![no_main]

use blinkpuff::app::commands::HostCommand;
use blinkpuff::protocol::{LINE_CAPACITY, LineEvent, LineReader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = LineReader::new();

    for &byte in data {
        let _ = reader.feed(byte);
        assert!(reader.pending() <= LINE_CAPACITY, "buffer exceeds capacity");
    }

    // Terminate whatever partial line the input left behind.
    let _ = reader.feed(b'\n');
    assert_eq!(reader.pending(), 0);

    let mut parsed = None;
    for &byte in b"START\n" {
        if let Some(event) = reader.feed(byte) {
            parsed = Some(event);
        }
    }
    assert_eq!(parsed, Some(LineEvent::Command(HostCommand::Start)));
});
