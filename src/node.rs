//! The three node roles, each a [`PollNode`].
//!
//! | Node              | Reads                  | Writes              |
//! |-------------------|------------------------|---------------------|
//! | `TransmitterNode` | fence pulse line       | radio link          |
//! | `ReceiverNode`    | radio link             | operator event sink |
//! | `GuardNode`       | fence voltage, tamper  | relay, alert sink   |
//!
//! Nodes share nothing; the only coupling is the radio link between
//! transmitter and receiver.

use embedded_hal::digital::{InputPin, OutputPin};
use log::{info, warn};

use crate::app::ports::{AlertSink, AnalogInput, FenceEventSink, RadioLink};
use crate::app::service::{GuardCycle, GuardService};
use crate::config::FenceConfig;
use crate::radio::{EventRelay, RadioMessage, WireFormat};
use crate::scheduler::PollNode;
use crate::sensors::fence_pulse::{PulseClassifier, PulseStats};

/// Packets drained from the link in one receiver cycle, at most.
pub const MAX_PACKETS_PER_CYCLE: usize = 8;

fn wire_format(config: &FenceConfig) -> WireFormat {
    if config.wire_checksum { WireFormat::Checked } else { WireFormat::Plain }
}

// ═══════════════════════════════════════════════════════════════
//  Transmitter
// ═══════════════════════════════════════════════════════════════

/// Samples the pulse line, classifies rising edges, radios each one.
pub struct TransmitterNode<P: InputPin, L: RadioLink> {
    line: P,
    classifier: PulseClassifier,
    relay: EventRelay,
    link: L,
    interval_ms: u32,
    line_faults: u32,
    last_sent: Option<RadioMessage>,
}

impl<P: InputPin, L: RadioLink> TransmitterNode<P, L> {
    pub fn new(config: &FenceConfig, line: P, link: L, start_ms: u64) -> Self {
        Self {
            line,
            classifier: PulseClassifier::new(config, start_ms),
            relay: EventRelay::new(wire_format(config)),
            link,
            interval_ms: config.pulse_poll_interval_ms,
            line_faults: 0,
            last_sent: None,
        }
    }

    pub fn pulse_stats(&self) -> PulseStats {
        self.classifier.stats()
    }

    pub fn relay(&self) -> &EventRelay {
        &self.relay
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn line_mut(&mut self) -> &mut P {
        &mut self.line
    }

    pub fn line_faults(&self) -> u32 {
        self.line_faults
    }

    /// Last message handed to the link successfully.
    pub fn last_sent(&self) -> Option<RadioMessage> {
        self.last_sent
    }
}

impl<P: InputPin, L: RadioLink> PollNode for TransmitterNode<P, L> {
    fn poll(&mut self, now_ms: u64) {
        let level = match self.line.is_high() {
            Ok(level) => level,
            Err(e) => {
                self.line_faults = self.line_faults.saturating_add(1);
                warn!("Pulse line read failed: {:?}", e);
                return;
            }
        };
        let Some(event) = self.classifier.on_sample(level, now_ms) else {
            return;
        };
        let classification = self.classifier.classification(&event);
        let message = RadioMessage::from_event(&event, classification);
        info!("Gap={}ms {}", message.gap_ms, message.status_text());

        match self.relay.transmit(&mut self.link, &event, classification) {
            Ok(sent) => self.last_sent = Some(sent),
            Err(e) => warn!("Radio: send failed: {}", e),
        }
    }

    fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    fn name(&self) -> &'static str {
        "transmitter"
    }
}

// ═══════════════════════════════════════════════════════════════
//  Receiver
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    pub packets: u32,
    pub events: u32,
    pub decode_failures: u32,
    pub link_errors: u32,
}

/// Drains the link and hands every packet to the operator sink.
pub struct ReceiverNode<L: RadioLink, S: FenceEventSink> {
    link: L,
    relay: EventRelay,
    sink: S,
    interval_ms: u32,
    stats: ReceiverStats,
}

impl<L: RadioLink, S: FenceEventSink> ReceiverNode<L, S> {
    pub fn new(config: &FenceConfig, link: L, sink: S) -> Self {
        Self {
            link,
            relay: EventRelay::new(wire_format(config)),
            sink,
            interval_ms: config.receiver_poll_interval_ms,
            stats: ReceiverStats::default(),
        }
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }
}

impl<L: RadioLink, S: FenceEventSink> PollNode for ReceiverNode<L, S> {
    fn poll(&mut self, _now_ms: u64) {
        for _ in 0..MAX_PACKETS_PER_CYCLE {
            match self.link.try_receive() {
                Ok(Some(packet)) => {
                    self.stats.packets = self.stats.packets.saturating_add(1);
                    let report = self.relay.forward(&packet, &mut self.sink);
                    if report.decoded.is_ok() {
                        self.stats.events = self.stats.events.saturating_add(1);
                    } else {
                        self.stats.decode_failures = self.stats.decode_failures.saturating_add(1);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    self.stats.link_errors = self.stats.link_errors.saturating_add(1);
                    warn!("Radio: receive failed: {}", e);
                    break;
                }
            }
        }
    }

    fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    fn name(&self) -> &'static str {
        "receiver"
    }
}

// ═══════════════════════════════════════════════════════════════
//  Guard
// ═══════════════════════════════════════════════════════════════

/// Voltage guard node: network housekeeping, then one guard cycle.
pub struct GuardNode<A, T, R, S>
where
    A: AnalogInput,
    T: InputPin,
    R: OutputPin,
    S: AlertSink,
{
    service: GuardService<A, T, R, S>,
    last_cycle: Option<GuardCycle>,
}

impl<A, T, R, S> GuardNode<A, T, R, S>
where
    A: AnalogInput,
    T: InputPin,
    R: OutputPin,
    S: AlertSink,
{
    /// Wrap a service whose relay has already been brought up with
    /// [`GuardService::start`].
    pub fn new(service: GuardService<A, T, R, S>) -> Self {
        Self { service, last_cycle: None }
    }

    pub fn service(&self) -> &GuardService<A, T, R, S> {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut GuardService<A, T, R, S> {
        &mut self.service
    }

    pub fn last_cycle(&self) -> Option<&GuardCycle> {
        self.last_cycle.as_ref()
    }
}

impl<A, T, R, S> PollNode for GuardNode<A, T, R, S>
where
    A: AnalogInput,
    T: InputPin,
    R: OutputPin,
    S: AlertSink,
{
    fn poll(&mut self, now_ms: u64) {
        self.service.sink_mut().maintain(now_ms);
        self.last_cycle = Some(self.service.poll(now_ms));
    }

    fn interval_ms(&self) -> u32 {
        self.service.config().guard_poll_interval_ms
    }

    fn name(&self) -> &'static str {
        "guard"
    }
}
