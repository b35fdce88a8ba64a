//! Wearer presence gate.
//!
//! Two-state hysteresis on the raw proximity count with a continuous-hold
//! debounce in each direction:
//!
//! ```text
//!            raw >= enter for >= enter_hold
//!   IDLE ───────────────────────────────────▶ PRESENT
//!     ▲                                          │
//!     └────── raw <= exit for >= exit_hold ──────┘
//! ```
//!
//! Entering is fast (40 ms) so donning is picked up quickly; leaving is slow
//! (300 ms) so a deep blink dip never flickers presence.

use log::info;

use crate::clock::elapsed;
use crate::config::PresenceConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceState {
    Idle,
    Present,
}

impl PresenceState {
    /// Protocol label used on STATUS lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Present => "PRESENCE",
        }
    }
}

/// A completed presence transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceTransition {
    pub from: PresenceState,
    pub to: PresenceState,
    pub at_ms: u32,
}

pub struct PresenceGate {
    config: PresenceConfig,
    state: PresenceState,
    /// Start of the current run of samples on the far side of the active threshold.
    hold_since_ms: Option<u32>,
    /// Time the current state was entered.
    entered_ms: u32,
}

impl PresenceGate {
    pub fn new(config: PresenceConfig) -> Self {
        Self {
            config,
            state: PresenceState::Idle,
            hold_since_ms: None,
            entered_ms: 0,
        }
    }

    /// Feed one raw sample. Returns the transition if this sample completed one.
    pub fn update(&mut self, raw: u16, now_ms: u32) -> Option<PresenceTransition> {
        let (qualifies, hold_ms, next) = match self.state {
            PresenceState::Idle => (
                raw >= self.config.enter_threshold,
                self.config.enter_hold_ms,
                PresenceState::Present,
            ),
            PresenceState::Present => (
                raw <= self.config.exit_threshold,
                self.config.exit_hold_ms,
                PresenceState::Idle,
            ),
        };

        if !qualifies {
            self.hold_since_ms = None;
            return None;
        }

        let since = *self.hold_since_ms.get_or_insert(now_ms);
        if elapsed(now_ms, since) < hold_ms {
            return None;
        }

        let from = self.state;
        self.state = next;
        self.hold_since_ms = None;
        self.entered_ms = now_ms;
        info!(
            "PRESENCE: {} -> {} (raw={}, t={}ms)",
            from.label(),
            next.label(),
            raw,
            now_ms
        );
        Some(PresenceTransition {
            from,
            to: next,
            at_ms: now_ms,
        })
    }

    pub fn state(&self) -> PresenceState {
        self.state
    }

    pub fn is_present(&self) -> bool {
        self.state == PresenceState::Present
    }

    /// Time at which the current state was entered.
    pub fn entered_ms(&self) -> u32 {
        self.entered_ms
    }
}
