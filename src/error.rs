//! Unified error types for the fence guard firmware.
//!
//! Each subsystem has its own small error enum and every one of them
//! converts into [`Error`], keeping the node loops' error handling
//! uniform.  All variants are `Copy` so they can be logged, counted and
//! passed around without allocation.
//!
//! Once a node is running none of these are fatal: the poll loops log
//! them and carry on.  The only fatal path is a failed bring-up of the
//! radio or network at startup (see [`crate::scheduler::halt_safe`]).

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The radio link could not send or receive.
    Link(LinkError),
    /// A received radio payload could not be parsed.
    Decode(DecodeError),
    /// An alert could not be delivered to the HTTP sink.
    Delivery(DeliveryError),
    /// A sensor could not be read or returned implausible data.
    Sensor(SensorFault),
    /// An actuator command failed.
    Actuator(ActuatorError),
    /// Peripheral or link initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Delivery(e) => write!(f, "delivery: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Radio link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The modem never acknowledged bring-up.
    NotInitialised,
    /// The modem rejected or failed a transmission.
    TxFailed,
    /// Reading from the modem failed.
    RxFailed,
    /// No response arrived within the link timeout.
    Timeout,
    /// Payload does not fit in a single radio packet.
    PayloadTooLarge,
    /// The modem produced a line that could not be understood.
    Malformed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialised => write!(f, "radio not initialised"),
            Self::TxFailed => write!(f, "transmit failed"),
            Self::RxFailed => write!(f, "receive failed"),
            Self::Timeout => write!(f, "radio timeout"),
            Self::PayloadTooLarge => write!(f, "payload too large"),
            Self::Malformed => write!(f, "malformed modem response"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload was empty after trimming padding.
    Empty,
    /// Payload is not valid UTF-8 text.
    NotText,
    /// Payload is longer than a radio packet can be.
    TooLong,
    /// Line does not start with `Gap=`.
    MissingPrefix,
    /// Gap value is missing or does not fit a `u32`.
    BadGap,
    /// The `ms` unit after the gap is missing.
    MissingUnit,
    /// Status text is neither the legal nor the alert phrase.
    UnknownStatus,
    /// A `*HH` checksum suffix was present but did not match.
    ChecksumMismatch,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty payload"),
            Self::NotText => write!(f, "payload is not text"),
            Self::TooLong => write!(f, "payload too long"),
            Self::MissingPrefix => write!(f, "missing Gap= prefix"),
            Self::BadGap => write!(f, "bad gap value"),
            Self::MissingUnit => write!(f, "missing ms unit"),
            Self::UnknownStatus => write!(f, "unknown status text"),
            Self::ChecksumMismatch => write!(f, "checksum mismatch"),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Alert delivery errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// No network connection; nothing was sent.
    NetworkDown,
    /// The HTTP connection could not be opened.
    ConnectFailed,
    /// The request failed mid-flight (write, timeout, read).
    RequestFailed,
    /// The alert record could not be serialised.
    Serialise,
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkDown => write!(f, "network down"),
            Self::ConnectFailed => write!(f, "HTTP connect failed"),
            Self::RequestFailed => write!(f, "HTTP request failed"),
            Self::Serialise => write!(f, "alert serialisation failed"),
        }
    }
}

impl From<DeliveryError> for Error {
    fn from(e: DeliveryError) -> Self {
        Self::Delivery(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor faults
// ---------------------------------------------------------------------------

/// Sensor faults are treated as unsafe: the voltage guard cuts fence
/// power when its analog reading faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFault {
    /// ADC read returned an error.
    AdcReadFailed,
    /// GPIO read returned an error.
    GpioReadFailed,
    /// Raw reading is outside the converter's range.
    OutOfRange(u16),
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
            Self::OutOfRange(raw) => write!(f, "reading out of range (raw={raw})"),
        }
    }
}

impl From<SensorFault> for Error {
    fn from(e: SensorFault) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

impl core::error::Error for LinkError {}
impl core::error::Error for DecodeError {}
impl core::error::Error for DeliveryError {}
impl core::error::Error for SensorFault {}
impl core::error::Error for ActuatorError {}
