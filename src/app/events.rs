//! Outbound application records.
//!
//! [`AlertRecord`]s leave the guard node through the
//! [`AlertSink`](super::ports::AlertSink) port; [`ReceivedReport`]s and
//! [`FenceEvent`]s leave the receiver node through the
//! [`FenceEventSink`](super::ports::FenceEventSink) port.  Adapters on the
//! other side decide what to do with them: POST to the alert server, log
//! to serial, etc.

use core::fmt;

use serde::Serialize;

use crate::error::DecodeError;
use crate::radio::message::RadioMessage;

/// Longest alert message carried, in bytes.
pub const ALERT_MESSAGE_CAPACITY: usize = 96;

pub const MSG_HIGH_VOLTAGE: &str = "high voltage detected, fence disconnected";
pub const MSG_SENSOR_FAULT: &str = "fence voltage sensor fault, fence disconnected";
pub const MSG_RECONNECTED: &str = "fence reconnected, voltage safe";
pub const MSG_TAMPER: &str = "tamper detected";
pub const MSG_HEARTBEAT: &str = "heartbeat alive";

// ───────────────────────────────────────────────────────────────
// Alert records (guard node)
// ───────────────────────────────────────────────────────────────

/// Alert severity, serialised upper-case (`"INFO"`, `"HIGH"`, `"CRITICAL"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One alert for the remote endpoint.  Serialises as
/// `{"type": "<severity>", "message": "<text>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertRecord {
    #[serde(rename = "type")]
    pub severity: Severity,
    pub message: heapless::String<ALERT_MESSAGE_CAPACITY>,
}

impl AlertRecord {
    /// Build a record, truncating `message` on a char boundary if it
    /// exceeds [`ALERT_MESSAGE_CAPACITY`].
    pub fn new(severity: Severity, message: &str) -> Self {
        let mut text = heapless::String::new();
        for ch in message.chars() {
            if text.push(ch).is_err() {
                break;
            }
        }
        Self { severity, message: text }
    }

    pub fn high_voltage() -> Self {
        Self::new(Severity::Critical, MSG_HIGH_VOLTAGE)
    }

    pub fn sensor_fault() -> Self {
        Self::new(Severity::Critical, MSG_SENSOR_FAULT)
    }

    pub fn reconnected() -> Self {
        Self::new(Severity::Info, MSG_RECONNECTED)
    }

    pub fn tamper() -> Self {
        Self::new(Severity::High, MSG_TAMPER)
    }

    pub fn heartbeat() -> Self {
        Self::new(Severity::Info, MSG_HEARTBEAT)
    }
}

impl fmt::Display for AlertRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

// ───────────────────────────────────────────────────────────────
// Received radio traffic (receiver node)
// ───────────────────────────────────────────────────────────────

/// Raw pass-through view of one received packet plus the outcome of the
/// structured decode.  Both paths are always produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedReport {
    /// Payload with non-printable bytes shown as `.`.
    pub text: heapless::String<{ crate::radio::MAX_PAYLOAD }>,
    /// Payload length in bytes before any trimming.
    pub len: usize,
    /// Received signal strength, dBm.
    pub rssi: i16,
    /// Signal-to-noise ratio, dB.
    pub snr: i8,
    pub decoded: Result<RadioMessage, DecodeError>,
}

/// A pulse classification recovered from the radio, with the signal
/// quality of the packet that carried it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceEvent {
    pub message: RadioMessage,
    pub rssi: i16,
    pub snr: i8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_serialises_with_type_key() {
        let json = serde_json::to_string(&AlertRecord::high_voltage()).unwrap();
        assert_eq!(
            json,
            r#"{"type":"CRITICAL","message":"high voltage detected, fence disconnected"}"#
        );
    }

    #[test]
    fn severities_serialise_upper_case() {
        let json = serde_json::to_string(&AlertRecord::tamper()).unwrap();
        assert!(json.contains(r#""type":"HIGH""#));
        let json = serde_json::to_string(&AlertRecord::heartbeat()).unwrap();
        assert!(json.contains(r#""type":"INFO""#));
    }

    #[test]
    fn long_message_is_truncated() {
        let long = "x".repeat(200);
        let rec = AlertRecord::new(Severity::Info, &long);
        assert_eq!(rec.message.len(), ALERT_MESSAGE_CAPACITY);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 2-byte chars: 48 of them fill 96 bytes exactly, the 49th must not split.
        let long = "\u{e9}".repeat(60);
        let rec = AlertRecord::new(Severity::Info, &long);
        assert_eq!(rec.message.chars().count(), 48);
    }

    #[test]
    fn display_shows_severity_and_text() {
        assert_eq!(AlertRecord::reconnected().to_string(), "[INFO] fence reconnected, voltage safe");
    }
}
