//! Typed protocol messages.
//!
//! A [`RawFrame`] is the untyped `{tag, fields}` record produced by
//! splitting a line; a [`Frame`] is its typed interpretation.  Both are
//! immutable once built.

use core::fmt;
use core::str::FromStr;

// ── Tags ─────────────────────────────────────────────────────

pub const TAG_ADC_DATA: &str = "ADC_DATA";
pub const TAG_SYSTEM_STATUS: &str = "SYSTEM_STATUS";
pub const TAG_TRANSMISSION: &str = "ADC_TRANSMISSION";
pub const TAG_HEARTBEAT: &str = "HEARTBEAT";
pub const TAG_PONG: &str = "PONG";
pub const TAG_ACK: &str = "ACK";

/// Status word the node reports when it is alive and configured.
pub const STATUS_READY: &str = "READY";

const FLAG_ENABLED: &str = "ENABLED";
const FLAG_DISABLED: &str = "DISABLED";

// ── Raw record ───────────────────────────────────────────────

/// Untyped frame: the tag and its comma-separated fields, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub tag: String,
    pub fields: Vec<String>,
}

// ── Commands ─────────────────────────────────────────────────

/// Outbound commands from the viewer to the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartAdc,
    StopAdc,
    Status,
    Hello,
    Ping,
    /// Free text from the manual-entry box, sent verbatim.
    Text(String),
}

impl Command {
    /// The wire token for this command.
    pub fn as_token(&self) -> &str {
        match self {
            Self::StartAdc => "START_ADC",
            Self::StopAdc => "STOP_ADC",
            Self::Status => "STATUS",
            Self::Hello => "HELLO",
            Self::Ping => "PING",
            Self::Text(text) => text,
        }
    }

    /// Match a bare token against the fixed command set.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "START_ADC" => Some(Self::StartAdc),
            "STOP_ADC" => Some(Self::StopAdc),
            "STATUS" => Some(Self::Status),
            "HELLO" => Some(Self::Hello),
            "PING" => Some(Self::Ping),
            _ => None,
        }
    }
}

impl FromStr for Command {
    type Err = core::convert::Infallible;

    /// Known tokens (surrounding whitespace ignored) map to their variant;
    /// anything else becomes [`Command::Text`] unchanged.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_token(s.trim()).unwrap_or_else(|| Self::Text(s.to_string())))
    }
}

// ── Transmission status ──────────────────────────────────────

/// Payload of an `ADC_TRANSMISSION` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmissionStatus {
    Started,
    Stopped,
    Error,
}

impl TransmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Started => "STARTED",
            Self::Stopped => "STOPPED",
            Self::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "STARTED" => Some(Self::Started),
            "STOPPED" => Some(Self::Stopped),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for TransmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render the enabled flag carried by `SYSTEM_STATUS`.
pub fn enabled_flag(enabled: bool) -> &'static str {
    if enabled { FLAG_ENABLED } else { FLAG_DISABLED }
}

/// Parse the enabled flag carried by `SYSTEM_STATUS`.
pub fn parse_enabled_flag(s: &str) -> Option<bool> {
    match s {
        FLAG_ENABLED => Some(true),
        FLAG_DISABLED => Some(false),
        _ => None,
    }
}

// ── Typed frame ──────────────────────────────────────────────

/// One ADC sample as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdcData {
    pub raw: u16,
    pub voltage: f32,
    pub timestamp_ms: Option<u64>,
}

/// A decoded protocol message.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// `ADC_DATA:<raw>,<voltage>[,<timestamp>]`
    AdcData(AdcData),
    /// `SYSTEM_STATUS:<status>[,ENABLED|DISABLED]`
    SystemStatus {
        status: String,
        enabled: Option<bool>,
    },
    /// `ADC_TRANSMISSION:STARTED|STOPPED|ERROR`
    Transmission(TransmissionStatus),
    /// `HEARTBEAT:<free text>`
    Heartbeat(String),
    /// Bare `PONG`.
    Pong,
    /// `ACK:<token>`: the node's reply to a command it does not know.
    Ack(String),
    /// A bare command token (`START_ADC`, `PING`, ...).
    Command(Command),
    /// Radio-module housekeeping (`OK`, `OK+CONN`, `+...`, `AT...`).
    ModuleAck(String),
    /// Anything else, preserved verbatim.
    Other(String),
}

impl Frame {
    /// Whether the dispatcher should act on this frame at all.
    pub fn is_application(&self) -> bool {
        !matches!(self, Self::ModuleAck(_))
    }
}
