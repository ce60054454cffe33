//! Enclosure tamper switch.
//!
//! Active-low input with pull-up: the line reads LOW while the enclosure
//! is open.  A detection raises one alert and then the line is ignored
//! for the debounce window, so one physical event produces one alert.
//! The window includes its last millisecond; a switch still held at the
//! first check after it alerts again.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::error::SensorFault;

pub struct TamperMonitor<P: InputPin> {
    pin: P,
    debounce_ms: u64,
    /// Detections are ignored up to and including this time.
    quiet_until_ms: Option<u64>,
    detections: u32,
}

impl<P: InputPin> TamperMonitor<P> {
    pub fn new(pin: P, debounce_ms: u64) -> Self {
        Self { pin, debounce_ms, quiet_until_ms: None, detections: 0 }
    }

    /// Read the line and report whether a new tamper event fired.
    pub fn poll(&mut self, now_ms: u64) -> Result<bool, SensorFault> {
        if self.in_debounce(now_ms) {
            return Ok(false);
        }
        let asserted = self.pin.is_low().map_err(|_| SensorFault::GpioReadFailed)?;
        Ok(self.on_level(asserted, now_ms))
    }

    /// Apply an already-read level.  `asserted` is the logical state
    /// (true = tampered), after active-low inversion.
    pub fn on_level(&mut self, asserted: bool, now_ms: u64) -> bool {
        if !asserted || self.in_debounce(now_ms) {
            return false;
        }
        self.quiet_until_ms = Some(now_ms.saturating_add(self.debounce_ms));
        self.detections = self.detections.saturating_add(1);
        warn!("Tamper: switch asserted at {} ms", now_ms);
        true
    }

    fn in_debounce(&self, now_ms: u64) -> bool {
        self.quiet_until_ms.is_some_and(|until| now_ms <= until)
    }

    pub fn detections(&self) -> u32 {
        self.detections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    struct Line(bool);

    impl embedded_hal::digital::ErrorType for Line {
        type Error = Infallible;
    }

    impl InputPin for Line {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.0)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.0)
        }
    }

    #[test]
    fn idle_high_line_never_fires() {
        let mut t = TamperMonitor::new(Line(true), 1000);
        for now in (0..5000).step_by(500) {
            assert!(!t.poll(now).unwrap());
        }
    }

    #[test]
    fn held_switch_fires_once_per_window() {
        let mut t = TamperMonitor::new(Line(false), 1000);
        assert!(t.poll(0).unwrap());
        assert!(!t.poll(300).unwrap());
        assert!(!t.poll(600).unwrap());
        assert!(!t.poll(999).unwrap());
        assert!(!t.poll(1000).unwrap());
        assert!(t.poll(1001).unwrap());
        assert_eq!(t.detections(), 2);
    }

    #[test]
    fn default_cadence_holds_one_alert_for_three_polls() {
        let mut t = TamperMonitor::new(Line(false), 1000);
        let fired: Vec<bool> = [0, 500, 1000, 1500].iter().map(|&now| t.poll(now).unwrap()).collect();
        assert_eq!(fired, vec![true, false, false, true]);
    }

    #[test]
    fn on_level_respects_debounce() {
        let mut t = TamperMonitor::new(Line(true), 1000);
        assert!(t.on_level(true, 100));
        assert!(!t.on_level(true, 200));
        assert!(!t.on_level(false, 1500));
        assert!(t.on_level(true, 1600));
    }
}
