//! Sensor-node service: the cooperative loop on the other end of the wire.
//!
//! [`NodeService::poll`] is called repeatedly by the main loop.  Each call:
//!
//! 1. drains whatever bytes the transport has (never blocks),
//! 2. applies every complete command and sends its replies,
//! 3. lets the scheduler fire due sample / heartbeat ticks.
//!
//! Commands are handled before telemetry, so a `STOP_ADC` arriving in the
//! same iteration as a due sample suppresses that sample.

use log::{debug, info, warn};

use crate::config::LinkConfig;
use crate::error::SensorError;
use crate::fsm::TransmissionMachine;
use crate::protocol::codec::encode_frame;
use crate::protocol::frame::{AdcData, Command, Frame, TransmissionStatus};
use crate::protocol::transport::{Transport, send_line};
use crate::protocol::FrameDecoder;
use crate::scheduler::Scheduler;
use crate::signal::{FilteredPoint, History, PeakState, Sample, SignalPipeline};

use super::ports::{AdcPort, SchedulerDelegate, TickKind};

/// Upper bound on transport reads per poll so a chatty peer cannot starve
/// the scheduler.
const MAX_READS_PER_POLL: usize = 16;
const READ_CHUNK: usize = 64;

// ───────────────────────────────────────────────────────────────
// Session context
// ───────────────────────────────────────────────────────────────

/// Counters kept by the node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub commands: u32,
    pub samples_sent: u32,
    pub send_failures: u32,
    pub heartbeats: u32,
    pub adc_errors: u32,
    pub parse_errors: u32,
}

/// All mutable node state, passed explicitly to every handler.
pub struct SessionContext {
    pub config: LinkConfig,
    pub transmission: TransmissionMachine,
    pub pipeline: SignalPipeline,
    pub peak: PeakState,
    pub history: History<FilteredPoint>,
    pub started_at_ms: u64,
    pub stats: NodeStats,
}

impl SessionContext {
    pub fn new(config: LinkConfig, now_ms: u64) -> Self {
        Self {
            transmission: TransmissionMachine::new(config.error_threshold),
            pipeline: SignalPipeline::new(&config),
            peak: PeakState::default(),
            history: History::new(),
            started_at_ms: now_ms,
            stats: NodeStats::default(),
            config,
        }
    }

    /// Zero the peak detector and restart filter warm-up.
    fn reset_signal(&mut self) {
        self.peak.reset();
        self.pipeline.reset();
    }
}

// ───────────────────────────────────────────────────────────────
// NodeService
// ───────────────────────────────────────────────────────────────

pub struct NodeService {
    ctx: SessionContext,
    scheduler: Scheduler,
    decoder: FrameDecoder,
}

impl NodeService {
    pub fn new(config: LinkConfig, now_ms: u64) -> Self {
        let scheduler = Scheduler::new(&config, now_ms);
        Self {
            ctx: SessionContext::new(config, now_ms),
            scheduler,
            decoder: FrameDecoder::new(),
        }
    }

    /// Send the boot banner `SYSTEM_STATUS:READY,DISABLED`.
    pub fn announce<T: Transport>(&mut self, transport: &mut T) {
        let frame = self.ctx.transmission.status_frame();
        if let Err(e) = send_line(transport, &encode_frame(&frame)) {
            warn!("Node: boot status not sent: {}", e);
        }
        info!("Node: ready");
    }

    /// One loop iteration.
    pub fn poll<T: Transport, A: AdcPort>(&mut self, now_ms: u64, transport: &mut T, adc: &mut A) {
        // 1 + 2. Inbound commands first.
        for cmd in self.read_commands(transport) {
            self.handle_command(&cmd, transport);
        }

        // 3. Scheduled telemetry.
        let enabled = self.ctx.transmission.is_enabled();
        let mut tick = NodeTick {
            ctx: &mut self.ctx,
            transport,
            adc,
        };
        self.scheduler.poll(now_ms, enabled, &mut tick);
    }

    fn read_commands<T: Transport>(&mut self, transport: &mut T) -> Vec<Command> {
        let mut commands = Vec::new();
        let mut buf = [0u8; READ_CHUNK];
        for _ in 0..MAX_READS_PER_POLL {
            if !transport.available() {
                break;
            }
            let n = match transport.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    warn!("Node: transport read failed: {:?}", e);
                    break;
                }
            };
            let stats = &mut self.ctx.stats;
            self.decoder.feed(&buf[..n], |item| match item {
                Ok(Frame::Command(cmd)) => commands.push(cmd),
                Ok(Frame::Other(text)) => commands.push(Command::Text(text)),
                Ok(other) => debug!("Node: ignoring inbound {:?}", other),
                Err(e) => {
                    stats.parse_errors += 1;
                    debug!("Node: dropped malformed line: {}", e);
                }
            });
        }
        commands
    }

    fn handle_command<T: Transport>(&mut self, cmd: &Command, transport: &mut T) {
        self.ctx.stats.commands += 1;
        debug!("Node: command {}", cmd.as_token());
        let was_enabled = self.ctx.transmission.is_enabled();
        let replies = self.ctx.transmission.handle_command(cmd);
        if was_enabled && !self.ctx.transmission.is_enabled() {
            self.ctx.reset_signal();
        }
        for reply in replies {
            if let Err(e) = send_line(transport, &encode_frame(&reply)) {
                warn!("Node: reply to {} not sent: {}", cmd.as_token(), e);
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn stats(&self) -> NodeStats {
        self.ctx.stats
    }

    pub fn is_sampling(&self) -> bool {
        self.ctx.transmission.is_enabled()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

// ───────────────────────────────────────────────────────────────
// Tick handler
// ───────────────────────────────────────────────────────────────

/// Borrowed view handed to the scheduler for one poll.
struct NodeTick<'a, T: Transport, A: AdcPort> {
    ctx: &'a mut SessionContext,
    transport: &'a mut T,
    adc: &'a mut A,
}

impl<T: Transport, A: AdcPort> NodeTick<'_, T, A> {
    fn on_sample(&mut self, now_ms: u64) {
        let raw = match self.adc.read_raw() {
            Ok(raw) if raw <= self.ctx.config.adc_max => raw,
            Ok(raw) => {
                self.ctx.stats.adc_errors += 1;
                warn!("Node: ADC reading {} skipped: {}", raw, SensorError::OutOfRange);
                return;
            }
            Err(e) => {
                self.ctx.stats.adc_errors += 1;
                warn!("Node: sample skipped: {}", e);
                return;
            }
        };

        let sample = Sample {
            raw,
            voltage: self.ctx.config.raw_to_voltage(raw),
            timestamp_ms: now_ms,
        };
        let ctx = &mut *self.ctx;
        ctx.pipeline.process(&sample, &mut ctx.peak, &mut ctx.history);

        let frame = Frame::AdcData(AdcData {
            raw: sample.raw,
            voltage: sample.voltage,
            timestamp_ms: Some(sample.timestamp_ms),
        });
        match send_line(self.transport, &encode_frame(&frame)) {
            Ok(()) => self.ctx.stats.samples_sent += 1,
            Err(e) => {
                self.ctx.stats.send_failures += 1;
                warn!("Node: sample send failed: {}", e);
                if let Some(status) = self.ctx.transmission.record_send_failure() {
                    self.ctx.reset_signal();
                    self.notify(status);
                }
            }
        }
    }

    fn on_heartbeat(&mut self, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(self.ctx.started_at_ms) / 1000;
        let frame = Frame::Heartbeat(format!("{elapsed}s"));
        match send_line(self.transport, &encode_frame(&frame)) {
            Ok(()) => self.ctx.stats.heartbeats += 1,
            Err(e) => warn!("Node: heartbeat not sent: {}", e),
        }
    }

    fn notify(&mut self, status: TransmissionStatus) {
        if let Err(e) = send_line(self.transport, &encode_frame(&Frame::Transmission(status))) {
            warn!("Node: {} notice not sent: {}", status, e);
        }
    }
}

impl<T: Transport, A: AdcPort> SchedulerDelegate for NodeTick<'_, T, A> {
    fn on_tick(&mut self, kind: TickKind, now_ms: u64) {
        match kind {
            TickKind::Sample => {
                // A failure earlier in this poll may have stopped sampling.
                if self.ctx.transmission.is_enabled() {
                    self.on_sample(now_ms);
                }
            }
            TickKind::Heartbeat => self.on_heartbeat(now_ms),
        }
    }
}
