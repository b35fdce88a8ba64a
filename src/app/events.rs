//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Events with a wire form are
//! rendered as protocol lines by [`crate::protocol::format_event`]; the rest
//! are for logging and local indication only.

use crate::detection::DetectionSnapshot;
use crate::detection::blink::BlinkEvent;
use crate::detection::presence::PresenceTransition;
use crate::error::SequenceError;
use crate::fsm::StateId;
use crate::scheduler::FRAME_COUNT;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Throttled raw sample telemetry.
    RawSample { time_ms: u32, prox: u16 },

    /// Periodic detection snapshot.
    Status { time_ms: u32, snapshot: DetectionSnapshot },

    /// A confirmed blink.
    Blink(BlinkEvent),

    /// The wearer put the device on or took it off.
    PresenceChanged(PresenceTransition),

    SequenceStarted {
        time_ms: u32,
        slots: [u8; FRAME_COUNT],
        lead_ms: u32,
    },

    SequenceEnded { time_ms: u32 },

    SequenceCancelled { time_ms: u32 },

    /// A sequence command could not be honoured.
    SequenceRejected { time_ms: u32, reason: SequenceError },

    /// The puff actuator changed state.
    ActuatorChanged { from: StateId, to: StateId },
}
