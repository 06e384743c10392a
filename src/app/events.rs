//! Outbound session events.
//!
//! The [`SessionCoordinator`](super::session::SessionCoordinator) emits
//! these through the [`EventSink`](super::ports::EventSink) port.  Adapters
//! on the other side decide what to do with them: log them, chart them,
//! update a status bar.

use crate::error::Error;
use crate::protocol::frame::TransmissionStatus;
use crate::signal::{BpmEstimate, FilteredPoint, Sample};

/// Link state as seen by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting,
}

/// Structured events emitted by the viewer session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A sample went through the pipeline.
    Sample {
        sample: Sample,
        point: FilteredPoint,
        bpm: Option<BpmEstimate>,
    },

    /// `SYSTEM_STATUS` from the node.
    Status {
        status: String,
        enabled: Option<bool>,
    },

    /// The node reported a transmission change.
    Transmission(TransmissionStatus),

    /// Liveness tick from the node.
    Heartbeat(String),

    /// Reply to `PING`.
    Pong,

    /// The node acknowledged a command it does not implement.
    Ack(String),

    /// A line with an unknown tag, passed through for display.
    Text(String),

    /// A command was written to the link.
    CommandSent(String),

    /// A command could not be delivered even after one reconnect attempt.
    CommandFailed { command: String, error: Error },

    /// The link changed state.
    Connection(ConnectionStatus),
}
