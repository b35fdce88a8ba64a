//! LED pattern engine with priority-based pattern selection.
//!
//! Generates time-varying RGB values for the status LED.  The main loop
//! calls `tick()` every iteration and feeds the result into
//! `StatusLed::set_colour()`.
//!
//! ## Priority hierarchy (highest first)
//!
//! 1. **Halt** — rapid red flash (8 Hz), safe halt after a fatal init error
//! 2. **Sequence** — pulsing blue while a puff sequence runs
//! 3. **Presence** — solid green when worn, dim teal when idle
//!
//! ## Pattern types
//!
//! | Pattern      | Description                      | Rate   |
//! |--------------|----------------------------------|--------|
//! | Solid        | Constant colour                  | —      |
//! | SlowPulse    | Triangular brightness fade       | 1 Hz   |
//! | RapidFlash   | Very fast on/off                 | 8 Hz   |

/// Colour as (R, G, B) tuple, each 0–255.
pub type Rgb = (u8, u8, u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternId {
    Solid,
    SlowPulse,
    RapidFlash,
    Off,
}

#[derive(Debug, Clone, Copy)]
pub struct PatternRequest {
    pub colour: Rgb,
    pub pattern: PatternId,
    pub priority: u8,
}

/// LED pattern engine. Stack-allocated, no heap.
pub struct LedPatternEngine {
    phase_ms: u32,
    active: Option<PatternRequest>,
    halt_request: Option<PatternRequest>,
    sequence_request: Option<PatternRequest>,
    presence_request: Option<PatternRequest>,
}

impl Default for LedPatternEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LedPatternEngine {
    pub fn new() -> Self {
        Self {
            phase_ms: 0,
            active: None,
            halt_request: None,
            sequence_request: None,
            presence_request: None,
        }
    }

    /// Set or clear the halt pattern (priority 1, highest).
    pub fn set_halt(&mut self, active: bool) {
        self.halt_request = active.then_some(PatternRequest {
            colour: COLOUR_HALT,
            pattern: PatternId::RapidFlash,
            priority: 1,
        });
    }

    /// Show (or stop showing) a running puff sequence (priority 2).
    pub fn set_sequence(&mut self, running: bool) {
        self.sequence_request = running.then_some(PatternRequest {
            colour: COLOUR_SEQUENCE,
            pattern: PatternId::SlowPulse,
            priority: 2,
        });
    }

    /// Wearer presence indication (priority 3, lowest).
    pub fn set_presence(&mut self, present: bool) {
        let colour = if present { COLOUR_PRESENT } else { COLOUR_IDLE };
        self.presence_request = Some(PatternRequest {
            colour,
            pattern: PatternId::Solid,
            priority: 3,
        });
    }

    /// Clear all patterns; the LED goes dark.
    pub fn clear_all(&mut self) {
        self.halt_request = None;
        self.sequence_request = None;
        self.presence_request = None;
        self.active = None;
        self.phase_ms = 0;
    }

    /// Advance the pattern phase by `delta_ms` and return the current RGB output.
    pub fn tick(&mut self, delta_ms: u32) -> Rgb {
        self.phase_ms = self.phase_ms.wrapping_add(delta_ms);

        let selected = self.select_active();
        let reset_phase = match (&self.active, &selected) {
            (Some(prev), Some(next)) => {
                prev.priority != next.priority || prev.pattern != next.pattern
            }
            (None, Some(_)) => true,
            _ => false,
        };
        if reset_phase {
            self.phase_ms = 0;
        }
        self.active = selected;

        match &self.active {
            Some(req) => self.generate(req.colour, req.pattern),
            None => (0, 0, 0),
        }
    }

    fn select_active(&self) -> Option<PatternRequest> {
        self.halt_request
            .or(self.sequence_request)
            .or(self.presence_request)
    }

    fn generate(&self, colour: Rgb, pattern: PatternId) -> Rgb {
        let (r, g, b) = colour;
        match pattern {
            PatternId::Solid => colour,
            PatternId::Off => (0, 0, 0),
            PatternId::SlowPulse => {
                let brightness = Self::triangle_brightness(self.phase_ms, 1000);
                Self::scale(r, g, b, brightness)
            }
            PatternId::RapidFlash => {
                let on = (self.phase_ms % 125) < 63;
                if on { colour } else { (0, 0, 0) }
            }
        }
    }

    /// Ramps 0→255→0 over `period_ms`.
    fn triangle_brightness(phase_ms: u32, period_ms: u32) -> u8 {
        let pos = (phase_ms % period_ms) as u64;
        let half = period_ms as u64 / 2;
        if pos < half {
            ((pos * 255) / half) as u8
        } else {
            (((period_ms as u64 - pos) * 255) / half) as u8
        }
    }

    fn scale(r: u8, g: u8, b: u8, brightness: u8) -> Rgb {
        let br = brightness as u16;
        (
            ((r as u16 * br) / 255) as u8,
            ((g as u16 * br) / 255) as u8,
            ((b as u16 * br) / 255) as u8,
        )
    }
}

pub const COLOUR_IDLE: Rgb = (0, 40, 32); // Dim teal
pub const COLOUR_PRESENT: Rgb = (0, 200, 40); // Green
pub const COLOUR_SEQUENCE: Rgb = (0, 60, 255); // Blue
pub const COLOUR_HALT: Rgb = (255, 0, 0); // Red
