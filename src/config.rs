//! System configuration parameters
//!
//! All tunable parameters for the fence monitor.  Every default is also
//! exported as a compile-time constant; nodes boot from
//! [`FenceConfig::default()`] and nothing is persisted across restarts.

use core::fmt;

use serde::{Deserialize, Serialize};

// --- Pulse classification ---
/// Shortest gap (ms) between energizer pulses that is still legal.
pub const MIN_PULSE_GAP_MS: u32 = 800;
/// Longest gap (ms) between energizer pulses that is still legal.
pub const MAX_PULSE_GAP_MS: u32 = 1200;

// --- Voltage guard ---
/// Fence voltage above which power is cut.
pub const ALLOWED_FENCE_VOLTAGE: f32 = 60.0;
/// ADC reference voltage at full scale.
pub const ADC_REFERENCE_VOLTS: f32 = 3.3;
/// Divider scale from ADC input volts to fence volts.
pub const FENCE_VOLTAGE_SCALE: f32 = 100.0;
/// Full-scale raw reading of the 12-bit ADC.
pub const ADC_MAX_RAW: u16 = 4095;
/// Window after a tamper alert during which the tamper line is ignored.
pub const TAMPER_DEBOUNCE_MS: u64 = 1000;
/// Interval between "heartbeat alive" alerts.
pub const HEARTBEAT_INTERVAL_MS: u64 = 10_000;

// --- Timing ---
pub const GUARD_POLL_INTERVAL_MS: u32 = 500;
pub const PULSE_POLL_INTERVAL_MS: u32 = 1;
pub const RECEIVER_POLL_INTERVAL_MS: u32 = 100;
/// Upper bound on any single radio send/receive exchange.
pub const LINK_TIMEOUT_MS: u32 = 200;
/// Upper bound on a single HTTP alert POST.
pub const HTTP_TIMEOUT_MS: u32 = 5000;

// --- Radio ---
pub const RADIO_FREQUENCY_HZ: u32 = 433_000_000;

/// What the pulse classifier does with the very first rising edge, when
/// there is no earlier edge to measure a gap against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FirstEdgePolicy {
    /// Report the first edge, classified illegal.
    Alert,
    /// Record the first edge as the baseline and report nothing.
    Suppress,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FenceConfig {
    // --- Pulse classifier ---
    pub min_gap_ms: u32,
    pub max_gap_ms: u32,
    pub first_edge_policy: FirstEdgePolicy,

    // --- Voltage guard ---
    pub allowed_voltage: f32,
    pub adc_reference_volts: f32,
    pub voltage_scale: f32,
    pub adc_max_raw: u16,
    pub tamper_debounce_ms: u64,
    pub heartbeat_interval_ms: u64,

    // --- Timing ---
    pub guard_poll_interval_ms: u32,
    pub pulse_poll_interval_ms: u32,
    pub receiver_poll_interval_ms: u32,
    pub link_timeout_ms: u32,
    pub http_timeout_ms: u32,

    // --- Radio ---
    pub radio_frequency_hz: u32,
    /// Append a `*HH` checksum to outgoing radio lines.
    pub wire_checksum: bool,
}

impl Default for FenceConfig {
    fn default() -> Self {
        Self {
            min_gap_ms: MIN_PULSE_GAP_MS,
            max_gap_ms: MAX_PULSE_GAP_MS,
            first_edge_policy: FirstEdgePolicy::Alert,

            allowed_voltage: ALLOWED_FENCE_VOLTAGE,
            adc_reference_volts: ADC_REFERENCE_VOLTS,
            voltage_scale: FENCE_VOLTAGE_SCALE,
            adc_max_raw: ADC_MAX_RAW,
            tamper_debounce_ms: TAMPER_DEBOUNCE_MS,
            heartbeat_interval_ms: HEARTBEAT_INTERVAL_MS,

            guard_poll_interval_ms: GUARD_POLL_INTERVAL_MS,
            pulse_poll_interval_ms: PULSE_POLL_INTERVAL_MS,
            receiver_poll_interval_ms: RECEIVER_POLL_INTERVAL_MS,
            link_timeout_ms: LINK_TIMEOUT_MS,
            http_timeout_ms: HTTP_TIMEOUT_MS,

            radio_frequency_hz: RADIO_FREQUENCY_HZ,
            wire_checksum: false,
        }
    }
}

impl FenceConfig {
    /// Reject values that would make a node misbehave.  Ranges are
    /// rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_gap_ms > self.max_gap_ms {
            return Err(ConfigError::ValidationFailed("min_gap_ms above max_gap_ms"));
        }
        if !is_positive(self.allowed_voltage) {
            return Err(ConfigError::ValidationFailed("allowed_voltage must be positive"));
        }
        if !is_positive(self.adc_reference_volts) || !is_positive(self.voltage_scale) {
            return Err(ConfigError::ValidationFailed("voltage scaling must be positive"));
        }
        if self.adc_max_raw == 0 {
            return Err(ConfigError::ValidationFailed("adc_max_raw must be non-zero"));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("heartbeat_interval_ms must be non-zero"));
        }
        if self.guard_poll_interval_ms == 0
            || self.pulse_poll_interval_ms == 0
            || self.receiver_poll_interval_ms == 0
        {
            return Err(ConfigError::ValidationFailed("poll intervals must be non-zero"));
        }
        if self.link_timeout_ms == 0 || self.http_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("timeouts must be non-zero"));
        }
        Ok(())
    }
}

/// NaN-aware "strictly above zero".
fn is_positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

/// Errors from [`FenceConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation; the text names the field.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}
