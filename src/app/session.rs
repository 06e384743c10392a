//! Viewer-side session coordinator: the hexagonal core of the viewer.
//!
//! [`SessionCoordinator`] owns the streaming decoder, the mirrored
//! transmission state, the signal pipeline and the display history for one
//! connection.  All I/O flows through port traits injected at call sites,
//! so the whole session is testable with mock adapters.
//!
//! ```text
//!  bytes ──▶ ┌───────────────────────────┐ ──▶ EventSink
//!            │    SessionCoordinator     │
//!  text  ──▶ │ Decoder · FSM · Pipeline  │ ──▶ LinkPort
//!            └───────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::config::LinkConfig;
use crate::error::{ConnectionError, Error, ParseError};
use crate::fsm::TransmissionMachine;
use crate::protocol::codec::{LINE_TERMINATOR, encode_command};
use crate::protocol::frame::{AdcData, Command, Frame, TransmissionStatus};
use crate::protocol::FrameDecoder;
use crate::signal::{FilteredPoint, History, PeakState, Sample, SignalPipeline};

use super::events::{ConnectionStatus, SessionEvent};
use super::ports::{EventSink, LinkPort};

// ───────────────────────────────────────────────────────────────
// Stats
// ───────────────────────────────────────────────────────────────

/// Session counters, for display and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Application frames dispatched.
    pub frames: u32,
    /// Samples run through the pipeline.
    pub samples: u32,
    /// Lines dropped as malformed.
    pub parse_errors: u32,
    /// Radio-module housekeeping lines ignored.
    pub module_acks: u32,
    /// Lines dropped for exceeding the line buffer.
    pub overflows: u32,
    /// Transport chunks evicted before the session saw them.
    pub dropped_chunks: u32,
    /// Disconnects handled.
    pub disconnects: u32,
}

// ───────────────────────────────────────────────────────────────
// SessionCoordinator
// ───────────────────────────────────────────────────────────────

/// Single owner of all per-session state on the viewer.
pub struct SessionCoordinator {
    decoder: FrameDecoder,
    transmission: TransmissionMachine,
    pipeline: SignalPipeline,
    peak: PeakState,
    history: History<FilteredPoint>,
    stats: SessionStats,
}

impl SessionCoordinator {
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            decoder: FrameDecoder::new(),
            transmission: TransmissionMachine::new(config.error_threshold),
            pipeline: SignalPipeline::new(config),
            peak: PeakState::default(),
            history: History::new(),
            stats: SessionStats::default(),
        }
    }

    // ── Inbound ───────────────────────────────────────────────

    /// Feed raw transport bytes.  Every complete line is decoded and
    /// dispatched before this returns.
    ///
    /// `now_ms` stamps samples whose frame carries no timestamp.
    pub fn on_bytes_received(&mut self, bytes: &[u8], now_ms: u64, sink: &mut impl EventSink) {
        let mut items = Vec::new();
        self.decoder.feed(bytes, |item| items.push(item));
        self.stats.overflows = self.decoder.stats().overflows;

        for item in items {
            match item {
                Ok(frame) => self.dispatch(frame, now_ms, sink),
                Err(e) => self.on_parse_error(&e),
            }
        }
    }

    fn on_parse_error(&mut self, e: &ParseError) {
        self.stats.parse_errors += 1;
        debug!("Session: dropped malformed line: {}", e);
    }

    fn dispatch(&mut self, frame: Frame, now_ms: u64, sink: &mut impl EventSink) {
        if !frame.is_application() {
            self.stats.module_acks += 1;
            debug!("Session: ignoring module line {:?}", frame);
            return;
        }
        self.stats.frames += 1;

        match frame {
            Frame::AdcData(data) => self.on_adc_data(data, now_ms, sink),
            Frame::SystemStatus { status, enabled } => {
                if let Some(enabled) = enabled {
                    let remote = if enabled {
                        TransmissionStatus::Started
                    } else {
                        TransmissionStatus::Stopped
                    };
                    if self.transmission.apply_remote(remote) && !enabled {
                        info!("Session: node reports sampling disabled");
                        self.reset_signal_state();
                    }
                }
                sink.emit(&SessionEvent::Status { status, enabled });
            }
            Frame::Transmission(status) => {
                if self.transmission.apply_remote(status) {
                    info!("Session: node transmission {}", status);
                }
                if status != TransmissionStatus::Started {
                    self.reset_signal_state();
                }
                sink.emit(&SessionEvent::Transmission(status));
            }
            Frame::Heartbeat(text) => sink.emit(&SessionEvent::Heartbeat(text)),
            Frame::Pong => sink.emit(&SessionEvent::Pong),
            Frame::Ack(token) => sink.emit(&SessionEvent::Ack(token)),
            Frame::Command(cmd) => sink.emit(&SessionEvent::Text(cmd.as_token().to_string())),
            Frame::Other(line) | Frame::ModuleAck(line) => sink.emit(&SessionEvent::Text(line)),
        }
    }

    fn on_adc_data(&mut self, data: AdcData, now_ms: u64, sink: &mut impl EventSink) {
        let sample = Sample {
            raw: data.raw,
            voltage: data.voltage,
            timestamp_ms: data.timestamp_ms.unwrap_or(now_ms),
        };
        let bpm = self
            .pipeline
            .process(&sample, &mut self.peak, &mut self.history);
        self.stats.samples += 1;

        let point = self.history.latest().copied().unwrap_or_default();
        sink.emit(&SessionEvent::Sample { sample, point, bpm });
    }

    // ── Outbound ──────────────────────────────────────────────

    /// Encode and send a command typed or clicked by the user.
    ///
    /// On failure exactly one reconnect attempt and one resend are made
    /// before the failure is reported to the sink.
    pub fn on_user_command(
        &mut self,
        text: &str,
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        let cmd: Command = match text.parse() {
            Ok(cmd) => cmd,
            Err(never) => match never {},
        };
        let line = encode_command(&cmd);
        let wire = format!("{line}{LINE_TERMINATOR}");

        let first = if link.is_connected() {
            link.send_line(&wire).map_err(Error::from)
        } else {
            Err(Error::from(ConnectionError::NotConnected))
        };

        let result = match first {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Session: send of {:?} failed ({}), reconnecting once", line, e);
                sink.emit(&SessionEvent::Connection(ConnectionStatus::Reconnecting));
                match link.reconnect() {
                    Ok(()) => {
                        sink.emit(&SessionEvent::Connection(ConnectionStatus::Connected));
                        link.send_line(&wire).map_err(Error::from)
                    }
                    Err(e) => {
                        sink.emit(&SessionEvent::Connection(ConnectionStatus::Disconnected));
                        Err(Error::from(e))
                    }
                }
            }
        };

        match &result {
            Ok(()) => {
                debug!("Session: sent {:?}", line);
                sink.emit(&SessionEvent::CommandSent(line));
            }
            Err(error) => {
                warn!("Session: giving up on {:?}: {}", line, error);
                sink.emit(&SessionEvent::CommandFailed {
                    command: line,
                    error: error.clone(),
                });
            }
        }
        result
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// The transport went away.  Transmission falls back to `Idle` and
    /// peak state is zeroed; display history is kept.
    pub fn on_disconnect(&mut self, sink: &mut impl EventSink) {
        info!("Session: disconnected");
        self.stats.disconnects += 1;
        self.transmission.reset();
        self.reset_signal_state();
        self.decoder.reset();
        sink.emit(&SessionEvent::Connection(ConnectionStatus::Disconnected));
    }

    /// The transport is (re-)established.
    pub fn on_connect(&mut self, sink: &mut impl EventSink) {
        info!("Session: connected");
        sink.emit(&SessionEvent::Connection(ConnectionStatus::Connected));
    }

    fn reset_signal_state(&mut self) {
        self.peak.reset();
        self.pipeline.reset();
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Transport chunks were lost upstream; `total` is the running count.
    /// The partial line is discarded and decoding resumes at the next line
    /// boundary so no frame is spliced across the gap.
    pub fn on_chunks_dropped(&mut self, total: u32) {
        warn!("Session: {} chunk(s) lost, resynchronising", total);
        self.stats.dropped_chunks = total;
        self.decoder.resync();
    }

    /// Whether the node is believed to be streaming samples.
    pub fn is_streaming(&self) -> bool {
        self.transmission.is_enabled()
    }

    pub fn peak_state(&self) -> &PeakState {
        &self.peak
    }

    pub fn history(&self) -> &History<FilteredPoint> {
        &self.history
    }

    /// Drop all display history (explicit user request only).
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
