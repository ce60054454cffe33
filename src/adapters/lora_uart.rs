//! LoRa UART modem adapter.
//!
//! Implements [`RadioLink`] over an AT-command LoRa module wired to a
//! UART.  The module does the radio work; this side only speaks its line
//! protocol:
//!
//! ```text
//!   → AT+SEND=<addr>,<len>,<data>\r\n         ← +OK | +ERR=<n>
//!   ← +RCV=<addr>,<len>,<data>,<rssi>,<snr>\r\n   (unsolicited)
//! ```
//!
//! Every wait is bounded: each read is limited by the link timeout, a
//! read that returns nothing ends the wait with [`LinkError::Timeout`],
//! and at most [`MAX_RESPONSE_LINES`] lines are consumed per command.
//! `+RCV` lines that arrive while waiting for `+OK` are queued for the
//! next `try_receive`.

use core::fmt::Write as _;

use log::{debug, info, warn};

use crate::app::ports::RadioLink;
use crate::error::LinkError;
use crate::radio::transport::Transport;
use crate::radio::{LinkPacket, MAX_PAYLOAD};

/// Lines consumed while waiting for one command response.
pub const MAX_RESPONSE_LINES: usize = 8;

const LINE_CAPACITY: usize = 128;
const RCV_QUEUE: usize = 4;

/// Longest command: `AT+SEND=65535,64,<64 bytes>\r\n`.
pub type Command = heapless::Vec<u8, 96>;

// ───────────────────────────────────────────────────────────────
// Pure line protocol
// ───────────────────────────────────────────────────────────────

pub fn format_send_command(address: u16, payload: &[u8]) -> Result<Command, LinkError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(LinkError::PayloadTooLarge);
    }
    let mut head: heapless::String<24> = heapless::String::new();
    write!(head, "AT+SEND={},{},", address, payload.len()).map_err(|_| LinkError::PayloadTooLarge)?;
    let mut cmd = Command::new();
    cmd.extend_from_slice(head.as_bytes()).map_err(|()| LinkError::PayloadTooLarge)?;
    cmd.extend_from_slice(payload).map_err(|()| LinkError::PayloadTooLarge)?;
    cmd.extend_from_slice(b"\r\n").map_err(|()| LinkError::PayloadTooLarge)?;
    Ok(cmd)
}

/// Parse `+RCV=<addr>,<len>,<data>,<rssi>,<snr>` (line ending stripped).
/// `<data>` may itself contain commas; `<len>` says where it ends.
pub fn parse_rcv_line(line: &[u8]) -> Result<LinkPacket, LinkError> {
    let rest = line.strip_prefix(b"+RCV=").ok_or(LinkError::Malformed)?;
    let (_address, rest) = split_field(rest)?;
    let (len, rest) = split_field(rest)?;
    let len: usize = parse_ascii(len)?;
    if len > MAX_PAYLOAD {
        return Err(LinkError::PayloadTooLarge);
    }
    if rest.len() < len {
        return Err(LinkError::Malformed);
    }
    let (data, rest) = rest.split_at(len);
    let rest = rest.strip_prefix(b",").ok_or(LinkError::Malformed)?;
    let (rssi, snr) = split_field(rest)?;
    LinkPacket::new(data, parse_ascii(rssi)?, parse_ascii(snr)?)
}

fn split_field(bytes: &[u8]) -> Result<(&[u8], &[u8]), LinkError> {
    let comma = bytes.iter().position(|&b| b == b',').ok_or(LinkError::Malformed)?;
    Ok((&bytes[..comma], &bytes[comma + 1..]))
}

fn parse_ascii<T: core::str::FromStr>(bytes: &[u8]) -> Result<T, LinkError> {
    core::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or(LinkError::Malformed)
}

/// Classification of one modem line.
#[derive(Debug, PartialEq, Eq)]
enum ModemLine {
    Ok,
    Err,
    Received(LinkPacket),
    Other,
}

fn classify_line(line: &[u8]) -> ModemLine {
    if line == b"+OK" {
        ModemLine::Ok
    } else if line.starts_with(b"+ERR") {
        ModemLine::Err
    } else if line.starts_with(b"+RCV=") {
        match parse_rcv_line(line) {
            Ok(p) => ModemLine::Received(p),
            Err(e) => {
                warn!("LoRa: dropping bad +RCV line ({})", e);
                ModemLine::Other
            }
        }
    } else {
        ModemLine::Other
    }
}

// ───────────────────────────────────────────────────────────────
// Link adapter
// ───────────────────────────────────────────────────────────────

pub struct LoraUartLink<T: Transport> {
    transport: T,
    peer_address: u16,
    timeout_ms: u32,
    rx_buf: heapless::Vec<u8, LINE_CAPACITY>,
    pending: heapless::Deque<LinkPacket, RCV_QUEUE>,
    initialised: bool,
}

impl<T: Transport> LoraUartLink<T> {
    pub fn new(transport: T, peer_address: u16, timeout_ms: u32) -> Self {
        Self {
            transport,
            peer_address,
            timeout_ms,
            rx_buf: heapless::Vec::new(),
            pending: heapless::Deque::new(),
            initialised: false,
        }
    }

    /// Configure the module.  Any command not acknowledged with `+OK`
    /// fails bring-up with [`LinkError::NotInitialised`].
    pub fn init(&mut self, own_address: u16, network_id: u8, frequency_hz: u32) -> Result<(), LinkError> {
        if let Err(e) = self.configure(own_address, network_id, frequency_hz) {
            warn!("LoRa: modem bring-up failed: {}", e);
            return Err(LinkError::NotInitialised);
        }
        self.initialised = true;
        info!(
            "LoRa: modem ready (addr={}, net={}, {} Hz)",
            own_address, network_id, frequency_hz
        );
        Ok(())
    }

    fn configure(&mut self, own_address: u16, network_id: u8, frequency_hz: u32) -> Result<(), LinkError> {
        self.command_fmt(format_args!("AT"))?;
        self.command_fmt(format_args!("AT+ADDRESS={}", own_address))?;
        self.command_fmt(format_args!("AT+NETWORKID={}", network_id))?;
        self.command_fmt(format_args!("AT+BAND={}", frequency_hz))
    }

    fn command_fmt(&mut self, args: core::fmt::Arguments<'_>) -> Result<(), LinkError> {
        let mut cmd: heapless::String<32> = heapless::String::new();
        cmd.write_fmt(args).map_err(|_| LinkError::Malformed)?;
        self.command(cmd.as_bytes())
    }

    fn command(&mut self, cmd: &[u8]) -> Result<(), LinkError> {
        self.write_all(cmd)?;
        if !cmd.ends_with(b"\r\n") {
            self.write_all(b"\r\n")?;
        }
        self.transport.flush().map_err(|_| LinkError::TxFailed)?;
        self.await_ok()
    }

    fn write_all(&mut self, mut data: &[u8]) -> Result<(), LinkError> {
        while !data.is_empty() {
            let n = self.transport.write(data).map_err(|_| LinkError::TxFailed)?;
            if n == 0 {
                return Err(LinkError::TxFailed);
            }
            data = &data[n..];
        }
        Ok(())
    }

    fn await_ok(&mut self) -> Result<(), LinkError> {
        for _ in 0..MAX_RESPONSE_LINES {
            let Some(line) = self.next_line(self.timeout_ms)? else {
                return Err(LinkError::Timeout);
            };
            match classify_line(&line) {
                ModemLine::Ok => return Ok(()),
                ModemLine::Err => return Err(LinkError::TxFailed),
                ModemLine::Received(p) => self.stash(p),
                ModemLine::Other => debug!("LoRa: ignoring '{}'", crate::radio::message::printable(&line)),
            }
        }
        Err(LinkError::Timeout)
    }

    fn stash(&mut self, packet: LinkPacket) {
        if self.pending.is_full() {
            warn!("LoRa: receive queue full, dropping oldest packet");
            self.pending.pop_front();
        }
        // Cannot fail: a slot was freed above if needed.
        let _ = self.pending.push_back(packet);
    }

    /// Next complete line (without CR/LF).  Each read waits at most
    /// `timeout_ms`; `None` once a read comes back empty.  The buffer
    /// capacity bounds how many reads one call can make.
    fn next_line(&mut self, timeout_ms: u32) -> Result<Option<heapless::Vec<u8, LINE_CAPACITY>>, LinkError> {
        loop {
            if let Some(nl) = self.rx_buf.iter().position(|&b| b == b'\n') {
                let mut line = heapless::Vec::new();
                // Fits: the line is a prefix of rx_buf, which has the same capacity.
                let _ = line.extend_from_slice(&self.rx_buf[..nl]);
                while line.last() == Some(&b'\r') {
                    line.pop();
                }
                let remainder: heapless::Vec<u8, LINE_CAPACITY> =
                    heapless::Vec::from_slice(&self.rx_buf[nl + 1..]).map_err(|()| LinkError::Malformed)?;
                self.rx_buf = remainder;
                if line.is_empty() {
                    continue;
                }
                return Ok(Some(line));
            }
            if self.rx_buf.is_full() {
                self.rx_buf.clear();
                return Err(LinkError::Malformed);
            }

            let mut chunk = [0u8; 32];
            let room = (LINE_CAPACITY - self.rx_buf.len()).min(chunk.len());
            let n = self
                .transport
                .read(&mut chunk[..room], timeout_ms)
                .map_err(|_| LinkError::RxFailed)?;
            if n == 0 {
                return Ok(None);
            }
            // Fits: `room` never exceeds the free capacity.
            let _ = self.rx_buf.extend_from_slice(&chunk[..n]);
        }
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T: Transport> RadioLink for LoraUartLink<T> {
    fn send(&mut self, payload: &[u8]) -> Result<(), LinkError> {
        if !self.initialised {
            return Err(LinkError::NotInitialised);
        }
        let cmd = format_send_command(self.peer_address, payload)?;
        self.command(&cmd)
    }

    fn try_receive(&mut self) -> Result<Option<LinkPacket>, LinkError> {
        if let Some(p) = self.pending.pop_front() {
            return Ok(Some(p));
        }
        if !self.initialised {
            return Err(LinkError::NotInitialised);
        }
        // Non-blocking: only consume lines already buffered or waiting.
        while let Some(line) = self.next_line(0)? {
            if let ModemLine::Received(p) = classify_line(&line) {
                return Ok(Some(p));
            }
        }
        Ok(None)
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF UART transport
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use uart::UartTransport;

#[cfg(target_os = "espidf")]
mod uart {
    use esp_idf_hal::delay::TickType;
    use esp_idf_hal::uart::UartDriver;
    use esp_idf_svc::sys::EspError;

    use crate::radio::transport::Transport;

    /// Blocking UART driver with per-call timeouts.
    pub struct UartTransport {
        driver: UartDriver<'static>,
    }

    impl UartTransport {
        pub fn new(driver: UartDriver<'static>) -> Self {
            Self { driver }
        }
    }

    impl Transport for UartTransport {
        type Error = EspError;

        fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, EspError> {
            self.driver.read(buf, TickType::new_millis(u64::from(timeout_ms)).ticks())
        }

        fn write(&mut self, data: &[u8]) -> Result<usize, EspError> {
            self.driver.write(data)
        }

        fn flush(&mut self) -> Result<(), EspError> {
            self.driver.wait_tx_done(TickType::new_millis(100).ticks())
        }

        fn available(&self) -> bool {
            self.driver.remaining_read().is_ok_and(|n| n > 0)
        }
    }
}
