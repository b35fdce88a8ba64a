//! Inbound host commands.
//!
//! The serial line reader turns complete lines into these; the
//! [`AppService`](super::service::AppService) acts on them at the start of
//! each loop iteration.

/// Commands the host can send over the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    /// Begin a 16-frame puff sequence.
    Start,
    /// Cancel the running sequence.
    Stop,
}

impl HostCommand {
    /// Exact, case-sensitive match of one complete line (terminator removed).
    pub fn parse(line: &[u8]) -> Option<Self> {
        match line {
            b"START" => Some(Self::Start),
            b"STOP" => Some(Self::Stop),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Stop => "STOP",
        }
    }
}
