//! Shared mutable context threaded through every FSM handler.
//!
//! `TransmissionContext` is the single struct that state handlers read from
//! and write to: the error counter, the reason for the next stop, and the
//! outbound notifications produced by transitions.

use crate::protocol::frame::TransmissionStatus;

/// Why the machine is about to enter `Idle`.  Decides which notification
/// the `Idle` entry action emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `STOP_ADC` command (or a remote STOPPED report).
    Requested,
    /// The send error counter reached its threshold.
    Fault,
    /// Session teardown or initial start; no notification.
    Reset,
}

/// The shared context passed to every state handler function.
#[derive(Debug)]
pub struct TransmissionContext {
    /// Failed sample sends since the last start.
    pub error_count: u32,
    /// Failures tolerated before `Running` is forced to `Idle`.
    pub error_threshold: u32,
    /// Set before any transition into `Idle`.
    pub stop_reason: StopReason,
    /// Notifications produced by transitions, drained by the owner.
    pub notices: Vec<TransmissionStatus>,
}

impl TransmissionContext {
    pub fn new(error_threshold: u32) -> Self {
        Self {
            error_count: 0,
            error_threshold: error_threshold.max(1),
            stop_reason: StopReason::Reset,
            notices: Vec::new(),
        }
    }

    /// Returns `true` once the error counter has reached the threshold.
    pub fn threshold_reached(&self) -> bool {
        self.error_count >= self.error_threshold
    }
}
