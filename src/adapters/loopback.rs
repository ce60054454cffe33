//! In-memory radio link.
//!
//! [`LoopbackLink::pair`] returns two endpoints; whatever one sends the
//! other receives, in order.  Used by the host simulator and by tests.
//! Loss can be injected to exercise the lossy-link paths: every Nth
//! packet sent is silently dropped, like a packet lost over the air.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::app::ports::RadioLink;
use crate::error::LinkError;
use crate::radio::{LinkPacket, MAX_PAYLOAD};

/// Packets buffered per direction before the oldest is dropped.
const QUEUE_DEPTH: usize = 32;

type Queue = Rc<RefCell<VecDeque<LinkPacket>>>;

pub struct LoopbackLink {
    tx: Queue,
    rx: Queue,
    rssi: i16,
    snr: i8,
    drop_every: Option<u32>,
    sent: u32,
    dropped: u32,
}

impl LoopbackLink {
    /// Two connected endpoints.
    pub fn pair() -> (Self, Self) {
        let a: Queue = Rc::default();
        let b: Queue = Rc::default();
        (Self::endpoint(a.clone(), b.clone()), Self::endpoint(b, a))
    }

    fn endpoint(tx: Queue, rx: Queue) -> Self {
        Self { tx, rx, rssi: -60, snr: 9, drop_every: None, sent: 0, dropped: 0 }
    }

    /// Signal quality stamped on packets this endpoint sends.
    pub fn with_signal(mut self, rssi: i16, snr: i8) -> Self {
        self.rssi = rssi;
        self.snr = snr;
        self
    }

    /// Drop every `n`th packet this endpoint sends.  `0` disables loss.
    pub fn with_drop_every(mut self, n: u32) -> Self {
        self.drop_every = (n > 0).then_some(n);
        self
    }

    /// Queue raw bytes for this endpoint to receive, bypassing the peer.
    pub fn inject(&self, payload: &[u8], rssi: i16, snr: i8) -> Result<(), LinkError> {
        let packet = LinkPacket::new(payload, rssi, snr)?;
        self.rx.borrow_mut().push_back(packet);
        Ok(())
    }

    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl RadioLink for LoopbackLink {
    fn send(&mut self, payload: &[u8]) -> Result<(), LinkError> {
        if payload.len() > MAX_PAYLOAD {
            return Err(LinkError::PayloadTooLarge);
        }
        self.sent = self.sent.wrapping_add(1);
        if self.drop_every.is_some_and(|n| self.sent % n == 0) {
            self.dropped = self.dropped.saturating_add(1);
            return Ok(());
        }
        let packet = LinkPacket::new(payload, self.rssi, self.snr)?;
        let mut q = self.tx.borrow_mut();
        if q.len() >= QUEUE_DEPTH {
            q.pop_front();
        }
        q.push_back(packet);
        Ok(())
    }

    fn try_receive(&mut self) -> Result<Option<LinkPacket>, LinkError> {
        Ok(self.rx.borrow_mut().pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_crossed() {
        let (mut a, mut b) = LoopbackLink::pair();
        a.send(b"ping").unwrap();
        b.send(b"pong").unwrap();
        assert_eq!(b.try_receive().unwrap().unwrap().payload.as_slice(), b"ping");
        assert_eq!(a.try_receive().unwrap().unwrap().payload.as_slice(), b"pong");
        assert!(a.try_receive().unwrap().is_none());
    }

    #[test]
    fn signal_quality_is_stamped() {
        let (a, mut b) = LoopbackLink::pair();
        let mut a = a.with_signal(-101, -3);
        a.send(b"x").unwrap();
        let p = b.try_receive().unwrap().unwrap();
        assert_eq!((p.rssi, p.snr), (-101, -3));
    }

    #[test]
    fn drop_injection_loses_every_nth() {
        let (a, mut b) = LoopbackLink::pair();
        let mut a = a.with_drop_every(3);
        for i in 0..9u8 {
            a.send(&[b'0' + i]).unwrap();
        }
        let mut got = Vec::new();
        while let Some(p) = b.try_receive().unwrap() {
            got.push(p.payload[0]);
        }
        assert_eq!(got, b"013467".to_vec());
        assert_eq!(a.dropped(), 3);
    }

    #[test]
    fn oversized_send_rejected() {
        let (mut a, _b) = LoopbackLink::pair();
        assert_eq!(a.send(&[0; MAX_PAYLOAD + 1]), Err(LinkError::PayloadTooLarge));
    }
}
