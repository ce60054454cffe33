//! Bench signal simulation.
//!
//! Stand-ins for the physical fence used by the host simulator and the
//! integration tests: a pulse-line generator for the transmitter node
//! and a scripted ADC for the guard node.

use std::collections::VecDeque;

use embedded_hal::digital::{ErrorType, InputPin};

use crate::app::ports::{AnalogInput, Clock};
use crate::config::FenceConfig;
use crate::error::SensorFault;
use crate::sensors::fence_voltage::raw_for_voltage;

/// Width of one simulated energizer pulse.
pub const PULSE_WIDTH_MS: u64 = 10;
/// Period of the legal energizer pattern.
pub const PULSE_PERIOD_MS: u64 = 1000;
/// Half period of the simulated mains-frequency fault (~50 Hz).
pub const AC_HALF_PERIOD_MS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMode {
    /// A short pulse once a second, like a healthy energizer.
    LegalPulse,
    /// Line stuck high.
    IllegalDc,
    /// Line toggling at mains frequency.
    IllegalAc,
}

/// Simulated fence pulse line.
///
/// Implements [`InputPin`] by sampling `level_at` at the clock's current
/// time, so it plugs into the transmitter node wherever a GPIO would.
pub struct SignalGenerator<C: Clock> {
    clock: C,
    mode: SignalMode,
}

impl<C: Clock> SignalGenerator<C> {
    pub fn new(clock: C, mode: SignalMode) -> Self {
        Self { clock, mode }
    }

    pub fn mode(&self) -> SignalMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: SignalMode) {
        self.mode = mode;
    }

    /// Line level at `now_ms`.  Pure in time.
    pub fn level_at(&self, now_ms: u64) -> bool {
        match self.mode {
            SignalMode::LegalPulse => now_ms % PULSE_PERIOD_MS < PULSE_WIDTH_MS,
            SignalMode::IllegalDc => true,
            SignalMode::IllegalAc => (now_ms / AC_HALF_PERIOD_MS) % 2 == 0,
        }
    }
}

impl<C: Clock> ErrorType for SignalGenerator<C> {
    type Error = core::convert::Infallible;
}

impl<C: Clock> InputPin for SignalGenerator<C> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level_at(self.clock.now_ms()))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level_at(self.clock.now_ms()))
    }
}

/// Scripted ADC: yields each queued reading once, then repeats the last.
#[derive(Debug, Clone)]
pub struct VoltageSweep {
    script: VecDeque<Result<u16, SensorFault>>,
    last: Result<u16, SensorFault>,
    reads: u32,
}

impl VoltageSweep {
    pub fn new(readings: impl IntoIterator<Item = Result<u16, SensorFault>>) -> Self {
        Self { script: readings.into_iter().collect(), last: Ok(0), reads: 0 }
    }

    /// Sweep through fence voltages, converted to raw counts under `config`.
    pub fn from_volts(volts: &[f32], config: &FenceConfig) -> Self {
        Self::new(volts.iter().map(|&v| Ok(raw_for_voltage(v, config))))
    }

    /// The simulator's default story: safe, a spike above the limit, then
    /// recovery.  `samples_per_phase` readings each.
    pub fn spike_and_recover(samples_per_phase: usize, config: &FenceConfig) -> Self {
        let safe = config.allowed_voltage * 0.5;
        let spike = config.allowed_voltage * 1.5;
        let mut volts = Vec::with_capacity(samples_per_phase * 3);
        volts.extend(core::iter::repeat_n(safe, samples_per_phase));
        volts.extend(core::iter::repeat_n(spike, samples_per_phase));
        volts.extend(core::iter::repeat_n(safe, samples_per_phase));
        Self::from_volts(&volts, config)
    }

    /// Append readings to the end of the script.
    pub fn push(&mut self, reading: Result<u16, SensorFault>) {
        self.script.push_back(reading);
    }

    pub fn reads(&self) -> u32 {
        self.reads
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl AnalogInput for VoltageSweep {
    fn read_raw(&mut self) -> Result<u16, SensorFault> {
        self.reads = self.reads.saturating_add(1);
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        self.last
    }
}
