//! Linear pump-duty ramp.
//!
//! Serviced once per loop iteration independent of the actuator state
//! machine, so a ramp started on a state entry is visible from the very
//! next service call and partial ramps show up mid-state.
//!
//! ```text
//!   duty
//!    to ┤            ┌──────────
//!       │          ╱
//!       │        ╱
//!  from ┤──────╱
//!       └──────┬─────┬──────────▶ t
//!            start  start+duration
//! ```

use crate::clock::elapsed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ramp {
    from: u16,
    to: u16,
    start_ms: u32,
    duration_ms: u32,
    active: bool,
    /// Last serviced output.
    current: u16,
}

impl Ramp {
    /// A settled ramp holding `duty`.
    pub const fn hold(duty: u16) -> Self {
        Self {
            from: duty,
            to: duty,
            start_ms: 0,
            duration_ms: 0,
            active: false,
            current: duty,
        }
    }

    /// Begin a new ramp, superseding any ramp in flight.  Callers normally
    /// pass [`Ramp::current`] as `from` so the output never jumps.
    pub fn start(&mut self, from: u16, to: u16, now_ms: u32, duration_ms: u32) {
        self.from = from;
        self.to = to;
        self.start_ms = now_ms;
        self.duration_ms = duration_ms;
        if duration_ms == 0 || from == to {
            self.active = false;
            self.current = to;
        } else {
            self.active = true;
            self.current = from;
        }
    }

    /// Advance the ramp to `now_ms` and return the duty to drive.
    pub fn service(&mut self, now_ms: u32) -> u16 {
        if !self.active {
            return self.current;
        }
        let t = elapsed(now_ms, self.start_ms);
        if t >= self.duration_ms {
            self.current = self.to;
            self.active = false;
        } else {
            self.current = interpolate(self.from, self.to, t, self.duration_ms);
        }
        self.current
    }

    pub fn current(&self) -> u16 {
        self.current
    }

    pub fn target(&self) -> u16 {
        self.to
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Default for Ramp {
    fn default() -> Self {
        Self::hold(0)
    }
}

/// `from + (to - from) * t / duration`, truncated toward `from`.
fn interpolate(from: u16, to: u16, t: u32, duration: u32) -> u16 {
    let delta = i64::from(to) - i64::from(from);
    let step = delta * i64::from(t) / i64::from(duration);
    (i64::from(from) + step) as u16
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn monotonic_and_exact(
            from in 0u16..=1023,
            to in 0u16..=1023,
            start in any::<u32>(),
            duration in 1u32..2000,
            steps in proptest::collection::vec(0u32..40, 1..200),
        ) {
            let mut r = Ramp::hold(from);
            r.start(from, to, start, duration);
            let (lo, hi) = (from.min(to), from.max(to));
            let mut prev = from;
            let mut now = start;
            for dt in steps {
                now = now.wrapping_add(dt);
                let d = r.service(now);
                prop_assert!(d >= lo && d <= hi);
                if to >= from {
                    prop_assert!(d >= prev);
                } else {
                    prop_assert!(d <= prev);
                }
                prev = d;
            }
            prop_assert_eq!(r.service(start.wrapping_add(duration)), to);
        }
    }
}
