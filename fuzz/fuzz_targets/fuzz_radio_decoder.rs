//! Fuzz target: radio payload decoding.
//!
//! Drives arbitrary bytes through both receive-side parsers, the modem's
//! `+RCV=` line parser and the `Gap=<n>ms <status>` message decoder, and
//! asserts that neither panics and that anything accepted re-encodes to
//! a line that decodes to the same message.
//!
//! cargo fuzz run fuzz_radio_decoder

#![no_main]

use fenceguard::adapters::lora_uart::parse_rcv_line;
use fenceguard::radio::message::printable;
use fenceguard::radio::{RadioMessage, WireFormat};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(msg) = RadioMessage::decode(data) {
        let line = msg.encode(WireFormat::Checked).expect("decoded message must re-encode");
        assert_eq!(RadioMessage::decode(line.as_bytes()), Ok(msg));
    }

    let shown = printable(data);
    assert!(shown.len() <= 64, "raw view exceeds payload size");

    if let Ok(packet) = parse_rcv_line(data) {
        assert!(packet.payload.len() <= 64);
        let _ = RadioMessage::decode(&packet.payload);
    }
});
