//! Sensor subsystem.
//!
//! - [`fence_pulse`]: rising-edge timing classifier for the pulse line
//!   (transmitter node).
//! - [`fence_voltage`]: fence voltage sense channel (guard node).

pub mod fence_pulse;
pub mod fence_voltage;

pub use fence_pulse::{Classification, PulseClassifier, PulseEvent};
pub use fence_voltage::{FenceSample, FenceVoltageSensor};
