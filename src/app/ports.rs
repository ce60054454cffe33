//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Node / GuardService (domain)
//! ```
//!
//! Driven adapters (radio modem, ADC, HTTP sink, Wi-Fi, clocks) implement
//! these traits.  The node loops and [`GuardService`](super::service::GuardService)
//! consume them via generics, so the domain core never touches hardware
//! directly.  Digital pins and sleeping use the `embedded-hal` traits
//! instead of crate-local ones.

use crate::error::{DeliveryError, LinkError, SensorFault};
use crate::radio::LinkPacket;

use super::events::{FenceEvent, ReceivedReport};

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Analog input port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One analog channel returning raw converter counts.
///
/// `embedded-hal` 1.0 has no ADC trait, so the crate carries its own.
pub trait AnalogInput {
    fn read_raw(&mut self) -> Result<u16, SensorFault>;
}

// ───────────────────────────────────────────────────────────────
// Radio link port
// ───────────────────────────────────────────────────────────────

/// Point-to-point, half-duplex, lossy radio capability.
///
/// No retries and no acknowledgements.  Implementations bound every call
/// by a timeout so a stalled modem never blocks the caller's poll loop
/// indefinitely.
pub trait RadioLink {
    /// Send one payload as one radio packet.  Fire-and-forget.
    fn send(&mut self, payload: &[u8]) -> Result<(), LinkError>;

    /// Return the next received packet, or `None` when nothing is waiting.
    fn try_receive(&mut self) -> Result<Option<LinkPacket>, LinkError>;
}

// ───────────────────────────────────────────────────────────────
// Alert sink port (driven adapter: domain → HTTP endpoint)
// ───────────────────────────────────────────────────────────────

/// Remote alert endpoint accepting a JSON body.
pub trait AlertSink {
    /// Whether the underlying network is up.  When it is not, the
    /// dispatcher skips the POST entirely.
    fn is_connected(&self) -> bool;

    /// POST `body` as `application/json`.  Returns the HTTP status code;
    /// any status counts as delivered.
    fn post_json(&mut self, body: &[u8]) -> Result<u16, DeliveryError>;

    /// Housekeeping for the network under the sink (reconnect pacing).
    /// Called once per guard cycle; sinks without a network ignore it.
    fn maintain(&mut self, _now_ms: u64) {}
}

// ───────────────────────────────────────────────────────────────
// Fence event sink (driven adapter: domain → operator display)
// ───────────────────────────────────────────────────────────────

/// Receiver-side output for everything that arrives over the radio.
pub trait FenceEventSink {
    /// Raw pass-through view of one packet, emitted for every packet.
    fn raw(&mut self, report: &ReceivedReport);

    /// One structured event recovered from a packet.
    fn event(&mut self, event: &FenceEvent);
}

// ───────────────────────────────────────────────────────────────
// Connectivity port
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConnectivityPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    AlreadyConnected,
}

impl core::fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::AlreadyConnected => write!(f, "already connected to AP"),
        }
    }
}

impl core::error::Error for ConnectivityError {}

impl From<ConnectivityError> for crate::error::Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Init(match e {
            ConnectivityError::NoCredentials => "no WiFi credentials",
            ConnectivityError::InvalidSsid => "invalid WiFi SSID",
            ConnectivityError::InvalidPassword => "invalid WiFi password",
            ConnectivityError::ConnectionFailed => "WiFi connection failed",
            ConnectivityError::AlreadyConnected => "WiFi already connected",
        })
    }
}

/// Network link used by the alert path.
pub trait ConnectivityPort {
    fn connect(&mut self) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    /// Drive reconnection; `now_ms` paces the backoff.
    fn poll(&mut self, now_ms: u64);
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
    fn rssi(&self) -> Option<i8>;
}
