//! ESP32 time adapter.
//!
//! The control loop runs on a wrapping `u32` millisecond clock (see
//! [`crate::clock`]); this adapter is where that clock comes from.
//!
//! - **`target_os = "espidf"`** — truncates `esp_timer_get_time()` (µs
//!   since boot, monotonic) to milliseconds.
//! - **`not(target_os = "espidf")`** — uses `std::time::Instant` for
//!   host-side simulation.

pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot, wrapping every ~49.7 days.
    #[cfg(target_os = "espidf")]
    pub fn uptime_ms(&self) -> u32 {
        let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() } as u64;
        (us / 1_000) as u32
    }

    /// Milliseconds since the adapter was created, wrapping.
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}
