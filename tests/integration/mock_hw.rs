//! Mock hardware for integration tests.
//!
//! Pins hand out shared handles so a test can keep observing (or
//! driving) a pin after it has been moved into a service or node.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use core::convert::Infallible;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};

use fenceguard::app::events::{FenceEvent, ReceivedReport};
use fenceguard::app::ports::{AlertSink, AnalogInput, FenceEventSink};
use fenceguard::config::FenceConfig;
use fenceguard::error::{DeliveryError, SensorFault};
use fenceguard::radio::transport::Transport;
use fenceguard::sensors::fence_voltage::raw_for_voltage;

// ── Relay coil ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoilFault;

impl embedded_hal::digital::Error for CoilFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Output pin recording every level written.  `true` = HIGH.
#[derive(Clone, Default)]
pub struct RecordingPin {
    pub writes: Rc<RefCell<Vec<bool>>>,
    pub fail: Rc<Cell<bool>>,
}

#[allow(dead_code)]
impl RecordingPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<bool> {
        self.writes.borrow().clone()
    }

    pub fn level(&self) -> Option<bool> {
        self.writes.borrow().last().copied()
    }
}

impl ErrorType for RecordingPin {
    type Error = CoilFault;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), CoilFault> {
        if self.fail.get() {
            return Err(CoilFault);
        }
        self.writes.borrow_mut().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), CoilFault> {
        if self.fail.get() {
            return Err(CoilFault);
        }
        self.writes.borrow_mut().push(true);
        Ok(())
    }
}

// ── Input lines ───────────────────────────────────────────────

/// Input pin whose level the test sets through a shared cell.
#[derive(Clone)]
pub struct ScriptedLine {
    pub high: Rc<Cell<bool>>,
}

#[allow(dead_code)]
impl ScriptedLine {
    pub fn new(high: bool) -> Self {
        Self { high: Rc::new(Cell::new(high)) }
    }

    /// Tamper switch at rest (pulled up).
    pub fn tamper_idle() -> Self {
        Self::new(true)
    }

    pub fn set(&self, high: bool) {
        self.high.set(high);
    }
}

impl ErrorType for ScriptedLine {
    type Error = Infallible;
}

impl InputPin for ScriptedLine {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.high.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.high.get())
    }
}

// ── ADC ───────────────────────────────────────────────────────

/// ADC returning queued readings in order, then the last one forever.
pub struct ScriptedAdc {
    readings: VecDeque<Result<u16, SensorFault>>,
    last: Result<u16, SensorFault>,
}

#[allow(dead_code)]
impl ScriptedAdc {
    pub fn volts(volts: &[f32], config: &FenceConfig) -> Self {
        Self::raw(volts.iter().map(|&v| Ok(raw_for_voltage(v, config))))
    }

    pub fn raw(readings: impl IntoIterator<Item = Result<u16, SensorFault>>) -> Self {
        Self { readings: readings.into_iter().collect(), last: Ok(0) }
    }
}

impl AnalogInput for ScriptedAdc {
    fn read_raw(&mut self) -> Result<u16, SensorFault> {
        if let Some(r) = self.readings.pop_front() {
            self.last = r;
        }
        self.last
    }
}

// ── Alert sink ────────────────────────────────────────────────

/// Alert sink recording every POST body.  Can be taken offline or made
/// to fail each request.
pub struct RecordingSink {
    pub bodies: Vec<String>,
    pub attempts: u32,
    pub connected: bool,
    pub fail_with: Option<DeliveryError>,
    pub status: u16,
    pub maintained: u32,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { bodies: Vec::new(), attempts: 0, connected: true, fail_with: None, status: 200, maintained: 0 }
    }

    pub fn failing(e: DeliveryError) -> Self {
        Self { fail_with: Some(e), ..Self::new() }
    }

    pub fn offline() -> Self {
        Self { connected: false, ..Self::new() }
    }

    /// Parsed `(type, message)` pairs of every body attempted.
    pub fn alerts(&self) -> Vec<(String, String)> {
        self.bodies
            .iter()
            .map(|b| {
                let v: serde_json::Value = serde_json::from_str(b).expect("alert body is JSON");
                (
                    v["type"].as_str().unwrap_or_default().to_owned(),
                    v["message"].as_str().unwrap_or_default().to_owned(),
                )
            })
            .collect()
    }

    pub fn count(&self, severity: &str) -> usize {
        self.alerts().iter().filter(|(t, _)| t == severity).count()
    }
}

impl AlertSink for RecordingSink {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn post_json(&mut self, body: &[u8]) -> Result<u16, DeliveryError> {
        self.attempts += 1;
        self.bodies.push(String::from_utf8_lossy(body).into_owned());
        match self.fail_with {
            Some(e) => Err(e),
            None => Ok(self.status),
        }
    }

    fn maintain(&mut self, _now_ms: u64) {
        self.maintained += 1;
    }
}

// ── Operator display ──────────────────────────────────────────

/// Receiver sink capturing raw reports and decoded events.
#[derive(Default)]
pub struct CaptureSink {
    pub raw: Vec<ReceivedReport>,
    pub events: Vec<FenceEvent>,
}

impl FenceEventSink for CaptureSink {
    fn raw(&mut self, report: &ReceivedReport) {
        self.raw.push(report.clone());
    }

    fn event(&mut self, event: &FenceEvent) {
        self.events.push(*event);
    }
}

// ── LoRa modem UART ───────────────────────────────────────────

/// Byte transport standing in for the modem's UART: bytes queued with
/// `push_rx` come back from `read`, everything written is captured.
#[derive(Debug, Default)]
pub struct ScriptedModem {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
}

impl ScriptedModem {
    pub fn push_rx(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    /// Take and clear everything written so far.
    pub fn take_tx(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx)
    }
}

impl Transport for ScriptedModem {
    type Error = ();

    fn read(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize, ()> {
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        self.tx.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn available(&self) -> bool {
        !self.rx.is_empty()
    }
}
