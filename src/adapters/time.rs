//! Time adapters.
//!
//! Provides monotonic time and sleeping for the poll loops.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//!   Sleeping uses `esp_idf_hal::delay::FreeRtos`.
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` for
//!   the host simulator, and [`StdDelay`] for sleeping.
//! - [`SimulatedTime`]: a shared virtual clock for tests: delaying
//!   advances it instead of waiting.

use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;

use crate::app::ports::Clock;

/// Monotonic clock for the ESP32 platform (and its host stand-in).
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

    /// Microseconds since boot (monotonic, wraps at `u64::MAX`).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: esp_timer_get_time is a read of the free-running timer.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since construction (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl Clock for Esp32TimeAdapter {
    fn now_ms(&self) -> u64 {
        self.uptime_us() / 1000
    }
}

/// Host sleep via `std::thread::sleep`.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

#[cfg(not(target_os = "espidf"))]
impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

// ───────────────────────────────────────────────────────────────
// Simulated time
// ───────────────────────────────────────────────────────────────

/// Shared virtual clock.  Clones see the same time; `delay_*` on any
/// clone advances it.  Nanosecond delays accumulate, so many short
/// delays still add up to whole milliseconds.
#[derive(Debug, Clone, Default)]
pub struct SimulatedTime {
    ns: Rc<Cell<u64>>,
}

impl SimulatedTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(ms: u64) -> Self {
        let t = Self::new();
        t.set_ms(ms);
        t
    }

    pub fn advance_ms(&self, ms: u64) {
        self.ns.set(self.ns.get().saturating_add(ms.saturating_mul(1_000_000)));
    }

    pub fn set_ms(&self, ms: u64) {
        self.ns.set(ms.saturating_mul(1_000_000));
    }
}

impl Clock for SimulatedTime {
    fn now_ms(&self) -> u64 {
        self.ns.get() / 1_000_000
    }
}

impl DelayNs for SimulatedTime {
    fn delay_ns(&mut self, ns: u32) {
        self.ns.set(self.ns.get().saturating_add(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance_ms(u64::from(ms));
    }
}
