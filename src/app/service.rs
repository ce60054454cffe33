//! Guard service: the guard node's hexagonal core.
//!
//! [`GuardService`] owns the voltage guard, tamper monitor, heartbeat
//! timer, relay driver and alert dispatcher.  All I/O flows through
//! generic port parameters, making the whole cycle testable with mock
//! adapters.
//!
//! ```text
//!  AnalogInput ──▶ ┌──────────────────────────┐ ──▶ AlertSink
//!                  │       GuardService       │
//!  InputPin ─────▶ │ VoltageGuard · Tamper ·  │
//!                  │        Heartbeat         │
//!  OutputPin ◀──── └──────────────────────────┘
//! ```
//!
//! Each cycle runs three independent alert producers in a fixed order
//! (voltage, tamper, heartbeat).  The relay is driven before any alert
//! is dispatched, and nothing the dispatcher reports flows back into the
//! guard.  Alerts are edge-triggered but the relay is not: a cycle that
//! finds the contact out of step with the guard state drives it again.

use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, info, warn};

use crate::config::FenceConfig;
use crate::drivers::relay::{RelayDriver, RelayState};
use crate::drivers::tamper::TamperMonitor;
use crate::error::ActuatorError;
use crate::safety::{FenceSample, GuardState, VoltageGuard};
use crate::scheduler::PeriodicTimer;
use crate::sensors::fence_voltage::FenceVoltageSensor;

use super::dispatcher::{AlertDispatcher, DispatchStats};
use super::events::AlertRecord;
use super::ports::{AlertSink, AnalogInput};

/// Most alerts one cycle can produce (one per producer).
pub const MAX_ALERTS_PER_CYCLE: usize = 3;

/// Everything one guard cycle did.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardCycle {
    pub sample: Option<FenceSample>,
    pub state: GuardState,
    pub alerts: heapless::Vec<AlertRecord, MAX_ALERTS_PER_CYCLE>,
}

pub struct GuardService<A, T, R, S>
where
    A: AnalogInput,
    T: InputPin,
    R: OutputPin,
    S: AlertSink,
{
    config: FenceConfig,
    sensor: FenceVoltageSensor<A>,
    guard: VoltageGuard,
    tamper: TamperMonitor<T>,
    relay: RelayDriver<R>,
    heartbeat: PeriodicTimer,
    dispatcher: AlertDispatcher<S>,
    cycles: u64,
}

impl<A, T, R, S> GuardService<A, T, R, S>
where
    A: AnalogInput,
    T: InputPin,
    R: OutputPin,
    S: AlertSink,
{
    /// Build the service.  The heartbeat interval is measured from `start_ms`.
    pub fn new(config: FenceConfig, adc: A, tamper_pin: T, relay_pin: R, sink: S, start_ms: u64) -> Self {
        Self {
            sensor: FenceVoltageSensor::new(adc),
            guard: VoltageGuard::new(&config),
            tamper: TamperMonitor::new(tamper_pin, config.tamper_debounce_ms),
            relay: RelayDriver::new(relay_pin),
            heartbeat: PeriodicTimer::new(config.heartbeat_interval_ms, start_ms),
            dispatcher: AlertDispatcher::new(sink),
            config,
            cycles: 0,
        }
    }

    /// Close the relay to match the initial `Energized` state.
    pub fn start(&mut self) -> Result<(), ActuatorError> {
        self.relay.apply(self.guard.state())?;
        info!(
            "GuardService started: limit {:.1} V, heartbeat every {} ms",
            self.config.allowed_voltage, self.config.heartbeat_interval_ms
        );
        Ok(())
    }

    /// Run one guard cycle at `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> GuardCycle {
        self.cycles = self.cycles.wrapping_add(1);
        let mut alerts: heapless::Vec<AlertRecord, MAX_ALERTS_PER_CYCLE> = heapless::Vec::new();

        // 1. Voltage: decide and actuate before anything is sent.
        let reading = self.sensor.read(&self.config);
        if let Ok(s) = reading {
            debug!("ADC: {}  V_fence: {:.1} V", s.adc_raw, s.voltage);
        }
        match self.guard.evaluate(reading) {
            Some(transition) => {
                // A failed write is logged by the driver and retried on the
                // following cycles; the alert goes out either way.
                let _ = self.relay.apply(transition.target());
                push_alert(&mut alerts, transition.alert());
            }
            None if !self.relay.matches(self.guard.state()) => {
                warn!("Relay: {:?} while guard is {:?}, retrying", self.relay.state(), self.guard.state());
                let _ = self.relay.apply(self.guard.state());
            }
            None => {}
        }

        // 2. Tamper
        match self.tamper.poll(now_ms) {
            Ok(true) => push_alert(&mut alerts, AlertRecord::tamper()),
            Ok(false) => {}
            Err(e) => warn!("Tamper: line read failed: {}", e),
        }

        // 3. Heartbeat
        if self.heartbeat.poll(now_ms) {
            push_alert(&mut alerts, AlertRecord::heartbeat());
        }

        // 4. Dispatch; outcome is logged and counted by the dispatcher.
        for alert in &alerts {
            let _ = self.dispatcher.dispatch(alert);
        }

        GuardCycle {
            sample: reading.ok(),
            state: self.guard.state(),
            alerts,
        }
    }

    pub fn state(&self) -> GuardState {
        self.guard.state()
    }

    pub fn relay_state(&self) -> RelayState {
        self.relay.state()
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    pub fn sink(&self) -> &S {
        self.dispatcher.sink()
    }

    pub fn sink_mut(&mut self) -> &mut S {
        self.dispatcher.sink_mut()
    }

    pub fn tamper_detections(&self) -> u32 {
        self.tamper.detections()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn config(&self) -> &FenceConfig {
        &self.config
    }
}

fn push_alert(alerts: &mut heapless::Vec<AlertRecord, MAX_ALERTS_PER_CYCLE>, alert: AlertRecord) {
    if alerts.push(alert).is_err() {
        warn!("GuardService: alert buffer full, dropping alert");
    }
}
