//! Transmitter → link → receiver, over the loopback link and over the
//! AT-command modem protocol.

use fenceguard::adapters::loopback::LoopbackLink;
use fenceguard::adapters::lora_uart::LoraUartLink;
use fenceguard::app::ports::RadioLink;
use fenceguard::config::{FenceConfig, FirstEdgePolicy};
use fenceguard::error::DecodeError;
use fenceguard::node::{ReceiverNode, TransmitterNode};
use fenceguard::radio::RadioMessage;
use fenceguard::scheduler::PollNode;
use fenceguard::sensors::fence_pulse::{classify, Classification, PulseClassifier};

use crate::mock_hw::{CaptureSink, ScriptedLine, ScriptedModem};

/// Drive a rising edge at each of `edges_ms` (10 ms wide pulses).
fn pulse<L: RadioLink>(tx: &mut TransmitterNode<ScriptedLine, L>, line: &ScriptedLine, edges_ms: &[u64]) {
    for &t in edges_ms {
        line.set(true);
        tx.poll(t);
        line.set(false);
        tx.poll(t + 10);
    }
}

#[test]
fn gap_of_950_ms_arrives_as_legal() {
    let cfg = FenceConfig::default();
    let (a, b) = LoopbackLink::pair();
    let line = ScriptedLine::new(false);
    let mut tx = TransmitterNode::new(&cfg, line.clone(), a.with_signal(-72, 8), 0);
    let mut rx = ReceiverNode::new(&cfg, b, CaptureSink::default());

    pulse(&mut tx, &line, &[100, 1050]);
    rx.poll(1100);

    let events = &rx.sink().events;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].message.classification, Classification::Illegal);
    assert_eq!(events[1].message, RadioMessage::new(950, Classification::Legal));
    assert_eq!(events[1].rssi, -72);
    assert_eq!(events[1].snr, 8);

    let raw = &rx.sink().raw[1];
    assert_eq!(raw.text.as_str(), "Gap=950ms OK (legal pulse)");
    assert_eq!(raw.len, raw.text.len());
}

#[test]
fn window_boundaries_are_inclusive() {
    assert_eq!(classify(799, 800, 1200), Classification::Illegal);
    assert_eq!(classify(800, 800, 1200), Classification::Legal);
    assert_eq!(classify(1200, 800, 1200), Classification::Legal);
    assert_eq!(classify(1201, 800, 1200), Classification::Illegal);
}

#[test]
fn boundaries_survive_the_air_gap() {
    let cfg = FenceConfig {
        first_edge_policy: FirstEdgePolicy::Suppress,
        ..FenceConfig::default()
    };
    let (a, b) = LoopbackLink::pair();
    let line = ScriptedLine::new(false);
    let mut tx = TransmitterNode::new(&cfg, line.clone(), a, 0);
    let mut rx = ReceiverNode::new(&cfg, b, CaptureSink::default());

    // Gaps: 799, 800, 1200, 1201.
    pulse(&mut tx, &line, &[0, 799, 1599, 2799, 4000]);
    rx.poll(5000);

    let got: Vec<_> = rx
        .sink()
        .events
        .iter()
        .map(|e| (e.message.gap_ms, e.message.classification))
        .collect();
    assert_eq!(
        got,
        vec![
            (799, Classification::Illegal),
            (800, Classification::Legal),
            (1200, Classification::Legal),
            (1201, Classification::Illegal),
        ]
    );
}

#[test]
fn rapid_toggling_is_illegal_not_a_crash() {
    let cfg = FenceConfig::default();
    let mut c = PulseClassifier::new(&cfg, 0);
    for t in 0..100u64 {
        if let Some(ev) = c.on_sample(t % 2 == 0, 5) {
            assert_eq!(c.classification(&ev), Classification::Illegal);
        }
    }
    assert_eq!(c.stats().legal, 0);
}

#[test]
fn checksummed_lines_decode_end_to_end() {
    let cfg = FenceConfig {
        wire_checksum: true,
        ..FenceConfig::default()
    };
    let (a, b) = LoopbackLink::pair();
    let line = ScriptedLine::new(false);
    let mut tx = TransmitterNode::new(&cfg, line.clone(), a, 0);
    let mut rx = ReceiverNode::new(&cfg, b, CaptureSink::default());

    pulse(&mut tx, &line, &[0, 1000]);
    rx.poll(2000);

    assert_eq!(rx.stats().events, 2);
    assert!(rx.sink().raw.iter().all(|r| r.text.contains(" *")));
    assert_eq!(rx.sink().events[1].message, RadioMessage::new(1000, Classification::Legal));
}

#[test]
fn corrupted_checksum_reports_unparseable() {
    let cfg = FenceConfig::default();
    let (_peer, b) = LoopbackLink::pair();
    let good = RadioMessage::new(1000, Classification::Legal)
        .encode(fenceguard::radio::WireFormat::Checked)
        .unwrap();
    let bad = good.replacen("1000", "1900", 1);
    let mut rx = ReceiverNode::new(&cfg, b, CaptureSink::default());
    rx.link_mut().inject(bad.as_bytes(), -80, 3).unwrap();
    rx.poll(0);

    let stats = rx.stats();
    assert_eq!(stats.packets, 1);
    assert_eq!(stats.decode_failures, 1);
    assert!(rx.sink().events.is_empty());
    assert_eq!(rx.sink().raw[0].decoded, Err(DecodeError::ChecksumMismatch));
    // Raw view still shows what arrived.
    assert_eq!(rx.sink().raw[0].text.as_str(), bad.as_str());
}

#[test]
fn modem_round_trip_over_at_protocol() {
    let cfg = FenceConfig::default();

    // Transmitter side: every command is acknowledged.
    let mut t = ScriptedModem::default();
    t.push_rx(b"+OK\r\n+OK\r\n+OK\r\n+OK\r\n");
    let mut tx_link = LoraUartLink::new(t, 2, cfg.link_timeout_ms);
    tx_link.init(1, 6, cfg.radio_frequency_hz).unwrap();
    tx_link.transport_mut().take_tx();
    tx_link.transport_mut().push_rx(b"+OK\r\n");

    let line = ScriptedLine::new(false);
    let mut tx = TransmitterNode::new(&cfg, line.clone(), tx_link, 0);
    line.set(true);
    tx.poll(1000);

    let sent = tx.link_mut().transport_mut().take_tx();
    assert_eq!(sent, b"AT+SEND=2,39,Gap=1000ms ALERT: Illegal fence pattern\r\n".to_vec());

    // Receiver side: the modem reports the same payload.
    let mut r = ScriptedModem::default();
    r.push_rx(b"+OK\r\n+OK\r\n+OK\r\n+OK\r\n");
    let mut rx_link = LoraUartLink::new(r, 1, cfg.link_timeout_ms);
    rx_link.init(2, 6, cfg.radio_frequency_hz).unwrap();
    rx_link
        .transport_mut()
        .push_rx(b"+RCV=1,39,Gap=1000ms ALERT: Illegal fence pattern,-48,11\r\n");

    let mut rx = ReceiverNode::new(&cfg, rx_link, CaptureSink::default());
    rx.poll(1100);
    let events = &rx.sink().events;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message, RadioMessage::new(1000, Classification::Illegal));
    assert_eq!(events[0].rssi, -48);
    assert_eq!(events[0].snr, 11);
}

#[test]
fn uninitialised_modem_send_fails_without_stopping_the_node() {
    let cfg = FenceConfig::default();
    let link = LoraUartLink::new(ScriptedModem::default(), 2, cfg.link_timeout_ms);
    let line = ScriptedLine::new(false);
    let mut tx = TransmitterNode::new(&cfg, line.clone(), link, 0);
    pulse(&mut tx, &line, &[0, 1000]);
    assert_eq!(tx.relay().stats().send_failures, 2);
    assert_eq!(tx.pulse_stats().edges, 2);
    assert!(tx.last_sent().is_none());
}
