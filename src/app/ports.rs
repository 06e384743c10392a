//! Port traits: the hexagonal boundary between link logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ SessionCoordinator / NodeService (domain)
//! ```
//!
//! Driven adapters (ADC, radio link, clock, UI sinks) implement these
//! traits.  The coordinator and the node service consume them via
//! generics, so the domain core never touches hardware directly.

use crate::error::{ConnectionError, SensorError, TransmissionError};

// ───────────────────────────────────────────────────────────────
// ADC port (driven adapter: hardware → node)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the node calls this once per sample tick.
pub trait AdcPort {
    /// One raw conversion in `0..=adc_max`.
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Link port (viewer → node direction)
// ───────────────────────────────────────────────────────────────

/// Outbound side of the viewer's connection to the node.
///
/// Implementations append nothing: `line` is already a complete wire
/// line including its terminator.
pub trait LinkPort {
    /// Write one encoded line.
    fn send_line(&mut self, line: &str) -> Result<(), TransmissionError>;

    /// Try to re-establish a dropped connection.  Single attempt.
    fn reconnect(&mut self) -> Result<(), ConnectionError>;

    /// Whether the link currently believes it is connected.
    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → UI / logging)
// ───────────────────────────────────────────────────────────────

/// The coordinator emits structured [`SessionEvent`](super::events::SessionEvent)s
/// through this port.  Adapters decide where they go (log, chart, file).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::SessionEvent);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the node loop)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a periodic task is due.
///
/// The [`Scheduler`](crate::scheduler::Scheduler) only tracks deadlines;
/// the node loop implements this to sample the ADC or emit a heartbeat.
pub trait SchedulerDelegate {
    /// Called when a tick fires.
    ///
    /// * `kind`: which periodic task is due.
    /// * `now_ms`: the monotonic time of the check that fired it.
    fn on_tick(&mut self, kind: TickKind, now_ms: u64);
}

/// Discriminant passed to [`SchedulerDelegate::on_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    /// Acquire and send one sample.
    Sample,
    /// Emit a liveness heartbeat.
    Heartbeat,
}
