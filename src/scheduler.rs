//! Multi-frame puff schedule.
//!
//! A `START` precomputes every frame of the sequence up front.  Each frame
//! picks one of four slots at random, and all four deadlines of a frame are
//! absolute times anchored to the sequence start, never to when the
//! previous frame actually finished:
//!
//! ```text
//!  start   lead        frame 0 (4 slots)             frame 1
//!    │◀────────▶│◀──────────── frame_ms ────────────▶│◀──────── …
//!               │ slot 0 │ slot 1 │ slot 2 │ slot 3  │
//!                        ▲
//!                        puff_at = start + lead + i·frame_ms + s·slot_ms
//!          precharge_at ─┘◀ precharge_ms
//!                        └─ puff_ms ─▶ recover_at ─ guard_ms ─▶ guard_done_at
//! ```
//!
//! Jitter in one frame therefore never drifts the frames after it.

use core::fmt::Write as _;

use heapless::String;
use rand::Rng;

use crate::config::{ActuatorConfig, SequenceConfig};

/// Frames in one sequence.
pub const FRAME_COUNT: usize = 16;
/// Candidate puff slots per frame.
pub const SLOTS_PER_FRAME: u8 = 4;

// ═══════════════════════════════════════════════════════════════
//  Frame deadlines
// ═══════════════════════════════════════════════════════════════

/// Absolute deadlines for one frame (all wrapping `u32` milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameEvent {
    pub slot: u8,
    pub precharge_at: u32,
    pub puff_at: u32,
    pub recover_at: u32,
    pub guard_done_at: u32,
}

impl FrameEvent {
    fn anchored(
        start_ms: u32,
        index: usize,
        slot: u8,
        seq: &SequenceConfig,
        act: &ActuatorConfig,
    ) -> Self {
        let offset = seq
            .lead_ms
            .wrapping_add((index as u32).wrapping_mul(seq.frame_ms()))
            .wrapping_add(u32::from(slot).wrapping_mul(seq.slot_ms));
        let puff_at = start_ms.wrapping_add(offset);
        let recover_at = puff_at.wrapping_add(act.puff_ms);
        Self {
            slot,
            precharge_at: puff_at.wrapping_sub(act.precharge_ms),
            puff_at,
            recover_at,
            guard_done_at: recover_at.wrapping_add(act.guard_ms),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Schedule
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceSchedule {
    start_ms: u32,
    lead_ms: u32,
    frames: [FrameEvent; FRAME_COUNT],
}

impl SequenceSchedule {
    /// Draw a uniformly random slot for every frame and derive its deadlines.
    pub fn build<R: Rng + ?Sized>(
        start_ms: u32,
        seq: &SequenceConfig,
        act: &ActuatorConfig,
        rng: &mut R,
    ) -> Self {
        let mut slots = [0u8; FRAME_COUNT];
        for slot in slots.iter_mut() {
            *slot = rng.gen_range(0..SLOTS_PER_FRAME);
        }
        Self::from_slots(start_ms, slots, seq, act)
    }

    /// Derive deadlines for a known slot pattern.
    pub fn from_slots(
        start_ms: u32,
        slots: [u8; FRAME_COUNT],
        seq: &SequenceConfig,
        act: &ActuatorConfig,
    ) -> Self {
        let mut frames = [FrameEvent::default(); FRAME_COUNT];
        for (i, (frame, &slot)) in frames.iter_mut().zip(slots.iter()).enumerate() {
            *frame = FrameEvent::anchored(start_ms, i, slot % SLOTS_PER_FRAME, seq, act);
        }
        Self {
            start_ms,
            lead_ms: seq.lead_ms,
            frames,
        }
    }

    pub fn frame(&self, index: usize) -> Option<FrameEvent> {
        self.frames.get(index).copied()
    }

    pub fn frames(&self) -> &[FrameEvent; FRAME_COUNT] {
        &self.frames
    }

    pub fn slots(&self) -> [u8; FRAME_COUNT] {
        self.frames.map(|f| f.slot)
    }

    /// Slots as the comma-separated list reported on `SEQ START`.
    pub fn slots_csv(&self) -> String<48> {
        let mut out = String::new();
        for (i, f) in self.frames.iter().enumerate() {
            if i > 0 {
                let _ = out.push(',');
            }
            let _ = write!(out, "{}", f.slot);
        }
        out
    }

    pub fn start_ms(&self) -> u32 {
        self.start_ms
    }

    pub fn lead_ms(&self) -> u32 {
        self.lead_ms
    }
}

// ═══════════════════════════════════════════════════════════════
//  Run bookkeeping
// ═══════════════════════════════════════════════════════════════

/// Progress through one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SequenceRun {
    pub active: bool,
    pub frame_index: usize,
    pub start_ms: u32,
}

impl SequenceRun {
    pub fn begin(&mut self, start_ms: u32) {
        self.active = true;
        self.frame_index = 0;
        self.start_ms = start_ms;
    }

    /// Step past a completed frame.  Returns `true` when that was the last
    /// frame and the run is now over.
    pub fn advance(&mut self) -> bool {
        self.frame_index += 1;
        if self.frame_index >= FRAME_COUNT {
            self.active = false;
            true
        } else {
            false
        }
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Frames completed so far.
    pub fn frames_done(&self) -> usize {
        self.frame_index.min(FRAME_COUNT)
    }
}
