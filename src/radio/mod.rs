//! Radio relay subsystem.
//!
//! ```text
//!   PulseEvent ─▶ RadioMessage::encode ─▶ RadioLink::send ~~~ air ~~~
//!       ~~~ RadioLink::try_receive ─▶ EventRelay::receive ─▶ ReceivedReport
//! ```
//!
//! - [`message`]: the text wire format and its tolerant decoder.
//! - [`relay`]: glue between classifier output, the link and the
//!   receiver's event sink.
//! - [`transport`]: byte channel used by the UART modem adapter.
//!
//! Link adapters live in `adapters::lora_uart` (real modem) and
//! `adapters::loopback` (in-memory).

pub mod message;
pub mod relay;
pub mod transport;

pub use crate::app::ports::RadioLink;
pub use message::{RadioMessage, WireFormat};
pub use relay::EventRelay;

use crate::error::LinkError;

/// Largest payload carried in one radio packet, in bytes.
pub const MAX_PAYLOAD: usize = 64;

/// One received packet with the link's signal quality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPacket {
    pub payload: heapless::Vec<u8, MAX_PAYLOAD>,
    /// Received signal strength, dBm.
    pub rssi: i16,
    /// Signal-to-noise ratio, dB.
    pub snr: i8,
}

impl LinkPacket {
    pub fn new(payload: &[u8], rssi: i16, snr: i8) -> Result<Self, LinkError> {
        let payload = heapless::Vec::from_slice(payload).map_err(|()| LinkError::PayloadTooLarge)?;
        Ok(Self { payload, rssi, snr })
    }
}
