//! Fence voltage guard.
//!
//! Edge-triggered two-state machine deciding whether the fence may stay
//! powered.  It is evaluated once per guard cycle with the latest
//! voltage reading; it returns a [`GuardTransition`] only when the state
//! actually changes, so a reading that hovers on one side of the
//! threshold produces exactly one alert, not one per sample.
//!
//! ```text
//!                 voltage > allowed  /  sensor fault
//!   ┌───────────┐ ─────────────────────────────────▶ ┌────────┐
//!   │ Energized │                                    │ Cutoff │
//!   └───────────┘ ◀───────────────────────────────── └────────┘
//!                   valid sample, voltage <= allowed
//! ```
//!
//! The guard decides purely from local readings.  Nothing about alert
//! delivery feeds back into it.

use log::{error, info, warn};

use crate::app::events::AlertRecord;
use crate::config::FenceConfig;
use crate::error::SensorFault;
pub use crate::sensors::fence_voltage::FenceSample;

/// Power state of the fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Relay closed, fence powered.
    Energized,
    /// Relay open, fence de-energised.
    Cutoff,
}

/// Why the guard cut power.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CutoffReason {
    HighVoltage { voltage: f32 },
    SensorFault(SensorFault),
}

/// A state change the caller must apply to the relay, then report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuardTransition {
    CutOff(CutoffReason),
    Restored { voltage: f32 },
}

impl GuardTransition {
    /// State the guard is in after this transition.
    pub fn target(&self) -> GuardState {
        match self {
            Self::CutOff(_) => GuardState::Cutoff,
            Self::Restored { .. } => GuardState::Energized,
        }
    }

    /// Alert that announces this transition.
    pub fn alert(&self) -> AlertRecord {
        match self {
            Self::CutOff(CutoffReason::HighVoltage { .. }) => AlertRecord::high_voltage(),
            Self::CutOff(CutoffReason::SensorFault(_)) => AlertRecord::sensor_fault(),
            Self::Restored { .. } => AlertRecord::reconnected(),
        }
    }
}

pub struct VoltageGuard {
    allowed_voltage: f32,
    state: GuardState,
    transitions: u32,
}

impl VoltageGuard {
    /// Starts `Energized`; the caller closes the relay to match.
    pub fn new(config: &FenceConfig) -> Self {
        Self {
            allowed_voltage: config.allowed_voltage,
            state: GuardState::Energized,
            transitions: 0,
        }
    }

    /// Evaluate one reading.  A sensor fault counts as unsafe.
    pub fn evaluate(&mut self, reading: Result<FenceSample, SensorFault>) -> Option<GuardTransition> {
        let transition = match (self.state, reading) {
            (GuardState::Energized, Ok(sample)) if sample.voltage > self.allowed_voltage => {
                error!(
                    "Guard: {:.1} V above limit {:.1} V (raw={}), cutting power",
                    sample.voltage, self.allowed_voltage, sample.adc_raw
                );
                Some(GuardTransition::CutOff(CutoffReason::HighVoltage { voltage: sample.voltage }))
            }
            (GuardState::Energized, Err(fault)) => {
                error!("Guard: voltage sensor fault ({}), cutting power", fault);
                Some(GuardTransition::CutOff(CutoffReason::SensorFault(fault)))
            }
            (GuardState::Cutoff, Ok(sample)) if sample.voltage <= self.allowed_voltage => {
                info!("Guard: {:.1} V back within limit, restoring power", sample.voltage);
                Some(GuardTransition::Restored { voltage: sample.voltage })
            }
            (GuardState::Cutoff, Err(fault)) => {
                warn!("Guard: voltage sensor fault ({}) while cut off", fault);
                None
            }
            _ => None,
        };

        if let Some(t) = transition {
            self.state = t.target();
            self.transitions = self.transitions.saturating_add(1);
        }
        transition
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Total state changes since boot.
    pub fn transitions(&self) -> u32 {
        self.transitions
    }
}
