//! Transport abstraction: any byte-oriented channel.
//!
//! Concrete implementations:
//! - UART serial to an HC-05/HM-10 style radio module
//! - In-memory loopback (host simulator, tests)
//!
//! The node loop is generic over `Transport`, so adding a new transport
//! requires zero changes to the protocol logic.

use log::warn;

use super::codec::to_wire;
use crate::error::TransmissionError;

/// Byte-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the transport.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Check if data is available for reading.
    fn available(&self) -> bool;
}

/// Write one protocol line (terminator appended) and flush.
///
/// A partial write counts as a failure: the peer would see a torn line.
pub fn send_line<T: Transport>(transport: &mut T, line: &str) -> Result<(), TransmissionError> {
    let bytes = to_wire(line);
    match transport.write(&bytes) {
        Ok(n) if n == bytes.len() => {}
        Ok(n) => {
            warn!("Transport: short write {}/{} for {:?}", n, bytes.len(), line);
            return Err(TransmissionError::ShortWrite);
        }
        Err(e) => {
            warn!("Transport: write failed for {:?}: {:?}", line, e);
            return Err(TransmissionError::WriteFailed);
        }
    }
    transport
        .flush()
        .map_err(|_| TransmissionError::WriteFailed)
}

/// A null transport that discards all writes and never reads.
/// Useful as a default when nothing is attached to the node.
pub struct NullTransport;

impl Transport for NullTransport {
    type Error = ();

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> {
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
