//! Serial line protocol.
//!
//! Host → device: newline-terminated `START` / `STOP`.
//! Device → host: one text line per [`AppEvent`](crate::app::events::AppEvent)
//! that has a wire form (raw samples, STATUS, BLINK, SEQ lifecycle).

pub mod format;
pub mod line;

pub use format::{LINE_MAX, format_event};
pub use line::{LINE_CAPACITY, LineEvent, LineReader};
