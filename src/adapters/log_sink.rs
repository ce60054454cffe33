//! Log-based sink adapters.
//!
//! [`LogEventSink`] implements [`FenceEventSink`] by writing received
//! radio traffic to the logger (UART console in production).
//! [`LogAlertSink`] implements [`AlertSink`] by logging the JSON body
//! instead of POSTing it; the host simulator uses it when no alert URL
//! is configured.

use log::{info, warn};

use crate::app::events::{FenceEvent, ReceivedReport};
use crate::app::ports::{AlertSink, FenceEventSink};
use crate::error::DeliveryError;
use crate::sensors::fence_pulse::Classification;

/// Adapter that logs every received packet and event to the console.
#[derive(Debug, Default)]
pub struct LogEventSink {
    illegal_events: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Illegal-pattern events seen so far.
    pub fn illegal_events(&self) -> u32 {
        self.illegal_events
    }
}

impl FenceEventSink for LogEventSink {
    fn raw(&mut self, report: &ReceivedReport) {
        info!(
            "RAW | size={} | data='{}' | RSSI={} dBm | SNR={} dB",
            report.len, report.text, report.rssi, report.snr
        );
        if let Err(e) = report.decoded {
            warn!("UNPARSEABLE | {} | data='{}'", e, report.text);
        }
    }

    fn event(&mut self, event: &FenceEvent) {
        match event.message.classification {
            Classification::Legal => {
                info!("PULSE | gap={}ms | legal | RSSI={}", event.message.gap_ms, event.rssi);
            }
            Classification::Illegal => {
                self.illegal_events = self.illegal_events.saturating_add(1);
                warn!(
                    "PULSE | gap={}ms | ILLEGAL FENCE PATTERN | RSSI={}",
                    event.message.gap_ms, event.rssi
                );
            }
        }
    }
}

/// Alert sink that only logs.  Always "connected"; reports status 200.
#[derive(Debug, Default)]
pub struct LogAlertSink {
    posted: u32,
}

impl LogAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posted(&self) -> u32 {
        self.posted
    }
}

impl AlertSink for LogAlertSink {
    fn is_connected(&self) -> bool {
        true
    }

    fn post_json(&mut self, body: &[u8]) -> Result<u16, DeliveryError> {
        self.posted = self.posted.saturating_add(1);
        info!("ALERT | {}", String::from_utf8_lossy(body));
        Ok(200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::message::RadioMessage;

    #[test]
    fn counts_illegal_events() {
        let mut sink = LogEventSink::new();
        let ev = |c| FenceEvent { message: RadioMessage::new(10, c), rssi: -70, snr: 5 };
        sink.event(&ev(Classification::Legal));
        sink.event(&ev(Classification::Illegal));
        sink.event(&ev(Classification::Illegal));
        assert_eq!(sink.illegal_events(), 2);
    }

    #[test]
    fn log_alert_sink_accepts_everything() {
        let mut sink = LogAlertSink::new();
        assert!(sink.is_connected());
        assert_eq!(sink.post_json(br#"{"type":"INFO","message":"heartbeat alive"}"#), Ok(200));
        assert_eq!(sink.posted(), 1);
    }
}
