//! Radio wire format.
//!
//! One classified pulse per packet, as a short ASCII line:
//!
//! ```text
//!   Gap=<n>ms OK (legal pulse)
//!   Gap=<n>ms ALERT: Illegal fence pattern
//! ```
//!
//! The radio's own packet boundary frames the message; there is no length
//! prefix.  [`WireFormat::Checked`] optionally appends ` *HH`, the XOR of
//! every byte before the space, in upper-case hex.
//!
//! Decoding is tolerant: NUL padding, CR/LF and surrounding whitespace
//! are stripped, and any status text beginning with `OK` or `ALERT` is
//! accepted.  Anything else is a [`DecodeError`], never a panic.

use core::fmt::Write as _;

use crate::error::{DecodeError, LinkError};
use crate::sensors::fence_pulse::{Classification, PulseEvent};

use super::MAX_PAYLOAD;

pub const LEGAL_STATUS: &str = "OK (legal pulse)";
pub const ILLEGAL_STATUS: &str = "ALERT: Illegal fence pattern";

const GAP_PREFIX: &str = "Gap=";
const GAP_UNIT: &str = "ms";

/// Outgoing line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// Bare text line.
    #[default]
    Plain,
    /// Text line plus ` *HH` XOR checksum.
    Checked,
}

/// A classified gap as carried over the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioMessage {
    pub gap_ms: u32,
    pub classification: Classification,
}

impl RadioMessage {
    pub fn new(gap_ms: u32, classification: Classification) -> Self {
        Self { gap_ms, classification }
    }

    pub fn from_event(event: &PulseEvent, classification: Classification) -> Self {
        Self::new(event.gap_ms, classification)
    }

    pub fn status_text(&self) -> &'static str {
        match self.classification {
            Classification::Legal => LEGAL_STATUS,
            Classification::Illegal => ILLEGAL_STATUS,
        }
    }

    /// Render the wire line.
    pub fn encode(&self, format: WireFormat) -> Result<heapless::String<MAX_PAYLOAD>, LinkError> {
        let mut line: heapless::String<MAX_PAYLOAD> = heapless::String::new();
        write!(line, "{}{}{} {}", GAP_PREFIX, self.gap_ms, GAP_UNIT, self.status_text())
            .map_err(|_| LinkError::PayloadTooLarge)?;
        if format == WireFormat::Checked {
            let sum = checksum(line.as_bytes());
            write!(line, " *{:02X}", sum).map_err(|_| LinkError::PayloadTooLarge)?;
        }
        Ok(line)
    }

    /// Parse a received payload.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        if payload.len() > MAX_PAYLOAD {
            return Err(DecodeError::TooLong);
        }
        let text = core::str::from_utf8(payload).map_err(|_| DecodeError::NotText)?;
        let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
        if text.is_empty() {
            return Err(DecodeError::Empty);
        }
        let text = verify_checksum(text)?;

        let rest = text.strip_prefix(GAP_PREFIX).ok_or(DecodeError::MissingPrefix)?;
        let digits_end = rest.bytes().position(|b| !b.is_ascii_digit()).unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(DecodeError::BadGap);
        }
        let gap_ms: u32 = rest[..digits_end].parse().map_err(|_| DecodeError::BadGap)?;
        let rest = rest[digits_end..].strip_prefix(GAP_UNIT).ok_or(DecodeError::MissingUnit)?;

        let classification = parse_status(rest.trim_start())?;
        Ok(Self { gap_ms, classification })
    }
}

fn parse_status(status: &str) -> Result<Classification, DecodeError> {
    if status == LEGAL_STATUS || status.starts_with("OK") {
        Ok(Classification::Legal)
    } else if status == ILLEGAL_STATUS || status.starts_with("ALERT") {
        Ok(Classification::Illegal)
    } else {
        Err(DecodeError::UnknownStatus)
    }
}

/// Strip and check a trailing ` *HH` suffix if one is present.  Lines
/// without a well-formed suffix pass through unchanged.
fn verify_checksum(text: &str) -> Result<&str, DecodeError> {
    let Some((body, hex)) = text.rsplit_once(" *") else {
        return Ok(text);
    };
    if hex.len() != 2 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Ok(text);
    }
    let expected = u8::from_str_radix(hex, 16).map_err(|_| DecodeError::ChecksumMismatch)?;
    if checksum(body.as_bytes()) != expected {
        return Err(DecodeError::ChecksumMismatch);
    }
    Ok(body.trim_end())
}

/// XOR of all bytes.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

/// Printable ASCII, space through tilde.
pub fn is_printable(b: u8) -> bool {
    (0x20..=0x7E).contains(&b)
}

/// Payload as printable text for the raw pass-through view: anything
/// outside printable ASCII shows as `.`.
pub fn printable(payload: &[u8]) -> heapless::String<MAX_PAYLOAD> {
    let mut out = heapless::String::new();
    for &b in payload.iter().take(MAX_PAYLOAD) {
        let c = if is_printable(b) { b as char } else { '.' };
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
