//! Mock adapters for integration tests.
//!
//! Records every frame written and every event emitted so tests can assert
//! on the full history without a real radio link.

use std::collections::VecDeque;

use pulselink::app::events::SessionEvent;
use pulselink::app::ports::{AdcPort, EventSink, LinkPort};
use pulselink::error::{ConnectionError, SensorError, TransmissionError};
use pulselink::protocol::transport::Transport;

// ── Node-side transport ───────────────────────────────────────

/// Transport whose inbound side is scripted and whose outbound side is
/// recorded line by line.
#[derive(Default)]
pub struct WireTransport {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
    /// Number of upcoming writes that fail.
    pub fail_writes: usize,
}

#[allow(dead_code)]
impl WireTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the node to read.
    pub fn inject(&mut self, text: &str) {
        self.inbound.extend(text.bytes());
    }

    /// Take everything written so far, split into lines.
    pub fn drain_lines(&mut self) -> Vec<String> {
        let text = String::from_utf8_lossy(&self.outbound).into_owned();
        self.outbound.clear();
        text.split("\r\n")
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Take the raw outbound bytes.
    pub fn drain_bytes(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outbound)
    }
}

impl Transport for WireTransport {
    type Error = &'static str;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, &'static str> {
        let n = buf.len().min(self.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(self.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, &'static str> {
        if self.fail_writes > 0 {
            self.fail_writes -= 1;
            return Err("radio busy");
        }
        self.outbound.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), &'static str> {
        Ok(())
    }

    fn available(&self) -> bool {
        !self.inbound.is_empty()
    }
}

// ── ADC ───────────────────────────────────────────────────────

/// ADC that replays a fixed list of readings, then fails.
pub struct ScriptedAdc {
    readings: VecDeque<u16>,
}

impl ScriptedAdc {
    pub fn new(readings: &[u16]) -> Self {
        Self {
            readings: readings.iter().copied().collect(),
        }
    }
}

impl AdcPort for ScriptedAdc {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        self.readings.pop_front().ok_or(SensorError::AdcReadFailed)
    }
}

// ── Viewer-side link ──────────────────────────────────────────

/// Link that records sent lines; failures and reconnect outcome are scripted.
pub struct MockLink {
    pub sent: Vec<String>,
    pub fail_sends: usize,
    pub reconnect_ok: bool,
    pub reconnects: usize,
    pub connected: bool,
}

impl Default for MockLink {
    fn default() -> Self {
        Self {
            sent: Vec::new(),
            fail_sends: 0,
            reconnect_ok: true,
            reconnects: 0,
            connected: true,
        }
    }
}

impl LinkPort for MockLink {
    fn send_line(&mut self, line: &str) -> Result<(), TransmissionError> {
        if !self.connected || self.fail_sends > 0 {
            self.fail_sends = self.fail_sends.saturating_sub(1);
            return Err(TransmissionError::WriteFailed);
        }
        self.sent.push(line.to_string());
        Ok(())
    }

    fn reconnect(&mut self) -> Result<(), ConnectionError> {
        self.reconnects += 1;
        if self.reconnect_ok {
            self.connected = true;
            Ok(())
        } else {
            Err(ConnectionError::ReconnectFailed)
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// ── Event sink ────────────────────────────────────────────────

/// Sink that keeps every event.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<SessionEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SessionEvent::Sample { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &SessionEvent) {
        self.events.push(event.clone());
    }
}
