//! Fence voltage sense channel.
//!
//! The fence is sampled through a resistive divider into ADC1.  The
//! conversion is a plain linear scale, no smoothing:
//!
//! ```text
//!   volts = raw / adc_max_raw × adc_reference_volts × voltage_scale
//! ```
//!
//! With the defaults (4095, 3.3 V, ×100) full scale reads 330 V.

use crate::app::ports::AnalogInput;
use crate::config::FenceConfig;
use crate::error::SensorFault;

/// One instantaneous fence voltage sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FenceSample {
    pub adc_raw: u16,
    pub voltage: f32,
}

impl FenceSample {
    /// Convert a raw reading.  Readings above `adc_max_raw` cannot come
    /// from a healthy converter and are reported as a fault.
    pub fn from_raw(adc_raw: u16, config: &FenceConfig) -> Result<Self, SensorFault> {
        if adc_raw > config.adc_max_raw {
            return Err(SensorFault::OutOfRange(adc_raw));
        }
        let voltage = f32::from(adc_raw) / f32::from(config.adc_max_raw)
            * config.adc_reference_volts
            * config.voltage_scale;
        Ok(Self { adc_raw, voltage })
    }
}

/// Raw ADC count that corresponds to `voltage` under `config`, rounded
/// to nearest.  Used by the simulator and tests to script voltages.
pub fn raw_for_voltage(voltage: f32, config: &FenceConfig) -> u16 {
    let full_scale = config.adc_reference_volts * config.voltage_scale;
    let raw = (voltage / full_scale * f32::from(config.adc_max_raw)).round();
    raw.clamp(0.0, f32::from(u16::MAX)) as u16
}

/// Reads the fence voltage channel through any [`AnalogInput`].
pub struct FenceVoltageSensor<A: AnalogInput> {
    adc: A,
    last: Option<FenceSample>,
}

impl<A: AnalogInput> FenceVoltageSensor<A> {
    pub fn new(adc: A) -> Self {
        Self { adc, last: None }
    }

    pub fn read(&mut self, config: &FenceConfig) -> Result<FenceSample, SensorFault> {
        let raw = self.adc.read_raw()?;
        let sample = FenceSample::from_raw(raw, config)?;
        self.last = Some(sample);
        Ok(sample)
    }

    /// Last good sample, if any.
    pub fn last(&self) -> Option<FenceSample> {
        self.last
    }
}
