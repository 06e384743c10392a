//! Unified error types for the link.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! node loop and the viewer task uniform.  None of these are fatal: every
//! variant is recoverable at the session level.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A received line could not be decoded.
    Parse(ParseError),
    /// A telemetry frame could not be written to the transport.
    Transmission(TransmissionError),
    /// The transport dropped or could not be re-established.
    Connection(ConnectionError),
    /// The ADC could not be read.
    Sensor(SensorError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "parse: {e}"),
            Self::Transmission(e) => write!(f, "transmission: {e}"),
            Self::Connection(e) => write!(f, "connection: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// A line that looked like an application frame but had a malformed payload.
///
/// Always carries the offending raw line so it can be logged verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: String,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A field that must be numeric was not.
    InvalidNumber { field: usize },
    /// The payload had the wrong number of fields.
    FieldCount { min: usize, max: usize, got: usize },
    /// `ADC_TRANSMISSION` carried something other than STARTED/STOPPED/ERROR.
    UnknownStatus,
}

impl ParseError {
    pub fn new(line: &str, kind: ParseErrorKind) -> Self {
        Self {
            line: line.to_string(),
            kind,
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNumber { field } => write!(f, "field {field} is not a number"),
            Self::FieldCount { min, max, got } => {
                write!(f, "expected {min}..={max} fields, got {got}")
            }
            Self::UnknownStatus => write!(f, "unknown transmission status"),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {:?}", self.kind, self.line)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Transmission errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmissionError {
    /// The transport accepted fewer bytes than the frame length.
    ShortWrite,
    /// The transport reported a write failure.
    WriteFailed,
}

impl fmt::Display for TransmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShortWrite => write!(f, "short write"),
            Self::WriteFailed => write!(f, "write failed"),
        }
    }
}

impl From<TransmissionError> for Error {
    fn from(e: TransmissionError) -> Self {
        Self::Transmission(e)
    }
}

// ---------------------------------------------------------------------------
// Connection errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
    /// No peer is connected.
    NotConnected,
    /// The single reconnect attempt failed.
    ReconnectFailed,
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::ReconnectFailed => write!(f, "reconnect failed"),
        }
    }
}

impl From<ConnectionError> for Error {
    fn from(e: ConnectionError) -> Self {
        Self::Connection(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC read returned an error or timed out.
    AdcReadFailed,
    /// Reading is outside the converter range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
