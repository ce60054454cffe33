//! Transport abstraction: any byte-oriented channel.
//!
//! Concrete implementations:
//! - ESP-IDF UART driver to the LoRa modem (`adapters::lora_uart::UartTransport`)
//! - [`NullTransport`] for an absent modem
//! - in-memory fakes in tests
//!
//! The modem link is generic over `Transport`, so the AT-command logic
//! is exercised on the host without a serial port.

/// Byte-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`, waiting at most
    /// `timeout_ms`.  Returns 0 if nothing arrived in time.
    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error>;

    /// Write `data` to the transport.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Check if data is available for reading.
    fn available(&self) -> bool;
}

/// A null transport that discards all writes and never reads.
/// Stands in for an absent modem; every exchange over it times out.
pub struct NullTransport;

impl Transport for NullTransport {
    type Error = ();

    fn read(&mut self, _buf: &mut [u8], _timeout_ms: u32) -> Result<usize, ()> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn available(&self) -> bool {
        false
    }
}
