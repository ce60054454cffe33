//! Event relay: classifier output onto the link, link packets into reports.
//!
//! Transmit side encodes one [`RadioMessage`] per pulse event and sends
//! it once; there is no retry.  Receive side always produces the raw
//! pass-through view and, alongside it, the structured decode result, so
//! a garbled packet is still visible to the operator.

use log::{debug, warn};

use crate::app::events::{FenceEvent, ReceivedReport};
use crate::app::ports::{FenceEventSink, RadioLink};
use crate::error::LinkError;
use crate::sensors::fence_pulse::{Classification, PulseEvent};

use super::message::{printable, RadioMessage, WireFormat};
use super::LinkPacket;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub sent: u32,
    pub send_failures: u32,
    pub received: u32,
    pub decoded: u32,
    pub decode_failures: u32,
}

pub struct EventRelay {
    format: WireFormat,
    stats: RelayStats,
}

impl EventRelay {
    pub fn new(format: WireFormat) -> Self {
        Self { format, stats: RelayStats::default() }
    }

    /// Encode and send one classified pulse.
    pub fn transmit<L: RadioLink>(
        &mut self,
        link: &mut L,
        event: &PulseEvent,
        classification: Classification,
    ) -> Result<RadioMessage, LinkError> {
        let message = RadioMessage::from_event(event, classification);
        let line = message.encode(self.format)?;
        match link.send(line.as_bytes()) {
            Ok(()) => {
                self.stats.sent = self.stats.sent.saturating_add(1);
                debug!("Relay: sent '{}'", line);
                Ok(message)
            }
            Err(e) => {
                self.stats.send_failures = self.stats.send_failures.saturating_add(1);
                Err(e)
            }
        }
    }

    /// Build the report for one received packet.
    pub fn receive(&mut self, packet: &LinkPacket) -> ReceivedReport {
        self.stats.received = self.stats.received.saturating_add(1);
        let decoded = RadioMessage::decode(&packet.payload);
        match decoded {
            Ok(_) => self.stats.decoded = self.stats.decoded.saturating_add(1),
            Err(e) => {
                self.stats.decode_failures = self.stats.decode_failures.saturating_add(1);
                warn!("Relay: unparseable packet ({}), {} bytes", e, packet.payload.len());
            }
        }
        ReceivedReport {
            text: printable(&packet.payload),
            len: packet.payload.len(),
            rssi: packet.rssi,
            snr: packet.snr,
            decoded,
        }
    }

    /// Receive a packet and hand both views to `sink`.
    pub fn forward<S: FenceEventSink>(&mut self, packet: &LinkPacket, sink: &mut S) -> ReceivedReport {
        let report = self.receive(packet);
        sink.raw(&report);
        if let Ok(message) = report.decoded {
            sink.event(&FenceEvent { message, rssi: report.rssi, snr: report.snr });
        }
        report
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;

    #[derive(Default)]
    struct CaptureLink {
        sent: Vec<Vec<u8>>,
        fail: bool,
    }

    impl RadioLink for CaptureLink {
        fn send(&mut self, payload: &[u8]) -> Result<(), LinkError> {
            if self.fail {
                return Err(LinkError::TxFailed);
            }
            self.sent.push(payload.to_vec());
            Ok(())
        }

        fn try_receive(&mut self) -> Result<Option<LinkPacket>, LinkError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct CaptureSink {
        raw: Vec<ReceivedReport>,
        events: Vec<FenceEvent>,
    }

    impl FenceEventSink for CaptureSink {
        fn raw(&mut self, report: &ReceivedReport) {
            self.raw.push(report.clone());
        }

        fn event(&mut self, event: &FenceEvent) {
            self.events.push(*event);
        }
    }

    fn event(gap_ms: u32) -> PulseEvent {
        PulseEvent { timestamp_ms: 10_000, gap_ms, first_edge: false }
    }

    #[test]
    fn transmit_sends_encoded_line() {
        let mut relay = EventRelay::new(WireFormat::Plain);
        let mut link = CaptureLink::default();
        relay.transmit(&mut link, &event(950), Classification::Legal).unwrap();
        assert_eq!(link.sent, vec![b"Gap=950ms OK (legal pulse)".to_vec()]);
        assert_eq!(relay.stats().sent, 1);
    }

    #[test]
    fn transmit_failure_is_counted_and_returned() {
        let mut relay = EventRelay::new(WireFormat::Plain);
        let mut link = CaptureLink { fail: true, ..CaptureLink::default() };
        assert_eq!(
            relay.transmit(&mut link, &event(20), Classification::Illegal),
            Err(LinkError::TxFailed)
        );
        assert_eq!(relay.stats().send_failures, 1);
    }

    #[test]
    fn forward_emits_raw_and_structured_views() {
        let mut relay = EventRelay::new(WireFormat::Plain);
        let mut sink = CaptureSink::default();
        let packet = LinkPacket::new(b"Gap=950ms OK (legal pulse)", -87, 7).unwrap();
        let report = relay.forward(&packet, &mut sink);
        assert_eq!(report.rssi, -87);
        assert_eq!(sink.raw.len(), 1);
        assert_eq!(sink.events.len(), 1);
        assert_eq!(sink.events[0].message.gap_ms, 950);
        assert_eq!(sink.events[0].message.classification, Classification::Legal);
    }

    #[test]
    fn garbled_packet_still_shows_raw_view() {
        let mut relay = EventRelay::new(WireFormat::Plain);
        let mut sink = CaptureSink::default();
        let packet = LinkPacket::new(b"G\x01p=95", -120, -5).unwrap();
        let report = relay.forward(&packet, &mut sink);
        assert_eq!(report.text.as_str(), "G.p=95");
        assert_eq!(report.decoded, Err(DecodeError::MissingPrefix));
        assert_eq!(sink.raw.len(), 1);
        assert!(sink.events.is_empty());
        assert_eq!(relay.stats().decode_failures, 1);
    }
}
