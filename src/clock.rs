//! Millisecond clock arithmetic.
//!
//! The loop clock is a `u32` millisecond counter that wraps after ~49.7
//! days.  Every comparison in the firmware goes through these helpers so a
//! wrap never reads as a huge elapsed time or a deadline in the far past.

/// Milliseconds elapsed from `since` to `now`, correct across one wrap.
#[inline]
pub fn elapsed(now_ms: u32, since_ms: u32) -> u32 {
    now_ms.wrapping_sub(since_ms)
}

/// True once `now_ms` is at or past `deadline_ms` (signed difference >= 0).
#[inline]
pub fn deadline_reached(now_ms: u32, deadline_ms: u32) -> bool {
    (now_ms.wrapping_sub(deadline_ms) as i32) >= 0
}

/// Fixed-period gate for periodic work inside the cooperative loop.
///
/// The first call to [`Interval::due`] always fires; after that the gate
/// opens whenever at least `period_ms` has elapsed since the last firing.
#[derive(Debug, Clone, Copy)]
pub struct Interval {
    period_ms: u32,
    last_ms: Option<u32>,
}

impl Interval {
    pub const fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            last_ms: None,
        }
    }

    pub fn due(&mut self, now_ms: u32) -> bool {
        match self.last_ms {
            Some(last) if elapsed(now_ms, last) < self.period_ms => false,
            _ => {
                self.last_ms = Some(now_ms);
                true
            }
        }
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_survives_wrap() {
        assert_eq!(elapsed(5, u32::MAX - 4), 10);
        assert_eq!(elapsed(100, 40), 60);
    }

    #[test]
    fn deadline_reached_across_wrap() {
        let deadline = u32::MAX - 10;
        assert!(!deadline_reached(u32::MAX - 11, deadline));
        assert!(deadline_reached(deadline, deadline));
        // Counter wrapped past the deadline.
        assert!(deadline_reached(3, deadline));
        // Deadline just after the wrap, now just before it.
        assert!(!deadline_reached(u32::MAX, 5));
    }

    #[test]
    fn interval_fires_first_then_periodically() {
        let mut iv = Interval::new(10);
        assert!(iv.due(0));
        assert!(!iv.due(5));
        assert!(!iv.due(9));
        assert!(iv.due(10));
        assert!(!iv.due(19));
        assert!(iv.due(25));
    }

    #[test]
    fn interval_across_wrap() {
        let mut iv = Interval::new(10);
        assert!(iv.due(u32::MAX - 3));
        assert!(!iv.due(2));
        assert!(iv.due(6));
    }
}
