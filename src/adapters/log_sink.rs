//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured session events to the
//! `log` facade.  A charting UI would implement the same trait.

use log::{debug, info, warn};

use crate::app::events::SessionEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`SessionEvent`].
///
/// Samples are logged at debug level except every `sample_every`-th one,
/// which goes to info so a 10 Hz stream does not flood the console.
pub struct LogEventSink {
    sample_every: u32,
    samples: u32,
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::with_sample_every(10)
    }

    pub fn with_sample_every(sample_every: u32) -> Self {
        Self {
            sample_every: sample_every.max(1),
            samples: 0,
        }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Sample { sample, point, bpm } => {
                self.samples = self.samples.wrapping_add(1);
                let bpm = bpm.map_or_else(|| "--".to_string(), |b| b.bpm.to_string());
                if self.samples % self.sample_every == 0 {
                    info!(
                        "SAMPLE | t={}ms raw={} V={:.3} | norm={:.3} filt={:.3} | bpm={}",
                        sample.timestamp_ms, sample.raw, sample.voltage, point.normalized, point.filtered, bpm,
                    );
                } else {
                    debug!(
                        "SAMPLE | t={}ms raw={} filt={:.3} bpm={}",
                        sample.timestamp_ms, sample.raw, point.filtered, bpm
                    );
                }
            }
            SessionEvent::Status { status, enabled } => {
                info!("STATUS | {} enabled={:?}", status, enabled);
            }
            SessionEvent::Transmission(status) => {
                info!("TRANSMISSION | {}", status);
            }
            SessionEvent::Heartbeat(text) => {
                info!("HEARTBEAT | {}", text);
            }
            SessionEvent::Pong => {
                info!("PONG");
            }
            SessionEvent::Ack(token) => {
                info!("ACK | {}", token);
            }
            SessionEvent::Text(line) => {
                info!("TEXT | {}", line);
            }
            SessionEvent::CommandSent(cmd) => {
                debug!("SENT | {}", cmd);
            }
            SessionEvent::CommandFailed { command, error } => {
                warn!("SEND FAILED | {} ({})", command, error);
            }
            SessionEvent::Connection(status) => {
                info!("LINK | {:?}", status);
            }
        }
    }
}
