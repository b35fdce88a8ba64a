//! Bounded command line reader.
//!
//! Bytes accumulate in a fixed 16-byte buffer until `\n`.  A trailing `\r`
//! is dropped so CRLF terminals work.  A line that outgrows the buffer is
//! discarded up to and including its terminator, after which parsing
//! resumes cleanly with the next line.

use heapless::Vec;

use crate::app::commands::HostCommand;

/// Longest accepted line, terminator excluded.
pub const LINE_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent {
    Command(HostCommand),
    /// A complete line that is not a command.
    Unknown,
    /// A line longer than [`LINE_CAPACITY`] was dropped.
    Overflow,
}

#[derive(Debug, Default)]
pub struct LineReader {
    buf: Vec<u8, LINE_CAPACITY>,
    discarding: bool,
}

impl LineReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte.  Returns an event when this byte completed a line.
    /// Blank lines produce nothing.
    pub fn feed(&mut self, byte: u8) -> Option<LineEvent> {
        if byte == b'\n' {
            return self.finish_line();
        }
        if self.discarding {
            return None;
        }
        if self.buf.push(byte).is_err() {
            self.buf.clear();
            self.discarding = true;
        }
        None
    }

    fn finish_line(&mut self) -> Option<LineEvent> {
        if core::mem::take(&mut self.discarding) {
            return Some(LineEvent::Overflow);
        }
        let mut line: &[u8] = &self.buf;
        if let [rest @ .., b'\r'] = line {
            line = rest;
        }
        let event = match HostCommand::parse(line) {
            Some(cmd) => Some(LineEvent::Command(cmd)),
            None if line.is_empty() => None,
            None => Some(LineEvent::Unknown),
        };
        self.buf.clear();
        event
    }

    /// Bytes buffered for the line in progress.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
