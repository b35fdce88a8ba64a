//! Serial line event sink.
//!
//! Implements [`EventSink`] by writing the protocol line of each
//! [`AppEvent`] verbatim (newline-terminated, no log prefix) to any
//! `std::io::Write`: the UART on device, a `Vec<u8>` in tests.  Events
//! without a wire form go to the diagnostic log instead.

use std::io::Write;

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::protocol::format_event;

pub struct SerialLineSink<W: Write> {
    out: W,
    lines: u32,
    write_errors: u32,
}

impl<W: Write> SerialLineSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            lines: 0,
            write_errors: 0,
        }
    }

    /// Lines written successfully.
    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) {
        let result = self
            .out
            .write_all(line.as_bytes())
            .and_then(|()| self.out.write_all(b"\n"))
            .and_then(|()| self.out.flush());
        match result {
            Ok(()) => self.lines = self.lines.wrapping_add(1),
            Err(e) => {
                self.write_errors = self.write_errors.wrapping_add(1);
                warn!("SERIAL: line dropped: {e}");
            }
        }
    }
}

impl<W: Write> EventSink for SerialLineSink<W> {
    fn emit(&mut self, event: &AppEvent) {
        if let Some(line) = format_event(event) {
            self.write_line(&line);
            return;
        }
        match event {
            AppEvent::PresenceChanged(t) => {
                info!("PRESENCE | {} -> {} at {}ms", t.from.label(), t.to.label(), t.at_ms);
            }
            AppEvent::ActuatorChanged { from, to } => {
                debug!("ACTUATOR | {:?} -> {:?}", from, to);
            }
            _ => warn!("SERIAL: event has no line form: {:?}", event),
        }
    }
}
