//! Fence power relay driver.
//!
//! The relay sits in series with the energizer output.  Coil HIGH closes
//! the contact and powers the fence; LOW opens it.
//!
//! Generic over any `embedded_hal::digital::OutputPin`, so the guard can
//! be driven by the real GPIO adapter on device and by a recording pin
//! in tests.

use embedded_hal::digital::OutputPin;
use log::{error, info};

use crate::error::ActuatorError;
use crate::safety::GuardState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Not yet driven since construction.
    Unknown,
    Closed,
    Open,
}

pub struct RelayDriver<P: OutputPin> {
    pin: P,
    state: RelayState,
}

impl<P: OutputPin> RelayDriver<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, state: RelayState::Unknown }
    }

    /// Close the relay: fence energised.
    pub fn close(&mut self) -> Result<(), ActuatorError> {
        self.pin.set_high().map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.state = RelayState::Closed;
        info!("Relay: closed (fence ON)");
        Ok(())
    }

    /// Open the relay: fence de-energised.
    pub fn open(&mut self) -> Result<(), ActuatorError> {
        self.pin.set_low().map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.state = RelayState::Open;
        info!("Relay: open (fence OFF)");
        Ok(())
    }

    /// Drive the relay to match a guard state.
    pub fn apply(&mut self, state: GuardState) -> Result<(), ActuatorError> {
        let result = match state {
            GuardState::Energized => self.close(),
            GuardState::Cutoff => self.open(),
        };
        if let Err(e) = result {
            error!("Relay: failed to apply {:?}: {}", state, e);
        }
        result
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Whether the last successful write left the contact where `guard`
    /// needs it.
    pub fn matches(&self, guard: GuardState) -> bool {
        matches!(
            (guard, self.state),
            (GuardState::Energized, RelayState::Closed) | (GuardState::Cutoff, RelayState::Open)
        )
    }

    /// Release the pin (for tests inspecting a recording pin).
    pub fn into_inner(self) -> P {
        self.pin
    }
}
