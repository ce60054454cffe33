//! Hardware adapter: bridges the raw `hw_init` helpers to port traits.
//!
//! Pins are exposed as `embedded_hal::digital::{InputPin, OutputPin}`
//! and the ADC channel as the crate's [`AnalogInput`] port.  This is the
//! only module besides `hw_init` that touches actual hardware.  On
//! non-espidf targets the helpers read and write simulation atomics.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::app::ports::AnalogInput;
use crate::drivers::hw_init;
use crate::error::SensorFault;
use crate::pins;

// ── Digital input ─────────────────────────────────────────────

/// A configured GPIO input.  Level reads cannot fail on the ESP32.
#[derive(Debug, Clone, Copy)]
pub struct GpioInput {
    pin: i32,
}

impl GpioInput {
    pub fn new(pin: i32) -> Self {
        Self { pin }
    }

    pub fn fence_pulse() -> Self {
        Self::new(pins::FENCE_PULSE_GPIO)
    }

    pub fn tamper() -> Self {
        Self::new(pins::TAMPER_GPIO)
    }
}

impl ErrorType for GpioInput {
    type Error = Infallible;
}

impl InputPin for GpioInput {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(hw_init::gpio_read(self.pin))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!hw_init::gpio_read(self.pin))
    }
}

// ── Digital output ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioWriteError {
    pub pin: i32,
}

impl embedded_hal::digital::Error for GpioWriteError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// A configured GPIO output.
#[derive(Debug, Clone, Copy)]
pub struct GpioOutput {
    pin: i32,
}

impl GpioOutput {
    pub fn new(pin: i32) -> Self {
        Self { pin }
    }

    pub fn relay() -> Self {
        Self::new(pins::RELAY_GPIO)
    }

    fn write(&self, high: bool) -> Result<(), GpioWriteError> {
        if hw_init::gpio_write(self.pin, high) {
            Ok(())
        } else {
            Err(GpioWriteError { pin: self.pin })
        }
    }
}

impl ErrorType for GpioOutput {
    type Error = GpioWriteError;
}

impl OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), GpioWriteError> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), GpioWriteError> {
        self.write(true)
    }
}

// ── Analog input ──────────────────────────────────────────────

/// One ADC1 channel.
#[derive(Debug, Clone, Copy)]
pub struct AdcInput {
    channel: u32,
}

impl AdcInput {
    pub fn new(channel: u32) -> Self {
        Self { channel }
    }

    pub fn fence_voltage() -> Self {
        Self::new(pins::FENCE_VOLTAGE_ADC_CHANNEL)
    }
}

impl AnalogInput for AdcInput {
    fn read_raw(&mut self) -> Result<u16, SensorFault> {
        hw_init::adc1_read(self.channel)
    }
}
