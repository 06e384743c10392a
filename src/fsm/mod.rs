//! Function-pointer finite state machine for transmission control.
//!
//! Classic embedded FSM pattern:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  StateTable                                              │
//! │  ┌─────────┬───────────┬──────────┬───────────────────┐  │
//! │  │ StateId │ on_enter  │ on_exit  │ on_update         │  │
//! │  ├─────────┼───────────┼──────────┼───────────────────┤  │
//! │  │ Idle    │ fn(ctx)   │ -        │ fn(ctx)->Option<> │  │
//! │  │ Running │ fn(ctx)   │ -        │ fn(ctx)->Option<> │  │
//! │  └─────────┴───────────┴──────────┴───────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands drive transitions through [`Fsm::force_transition`]; the only
//! automatic transition is the error-threshold stop, evaluated by
//! `on_update` each time a send failure is recorded.
//! [`TransmissionMachine`] wraps the engine with the command/response
//! contract used by the node and mirrored by the viewer.

pub mod context;
pub mod states;

use context::{StopReason, TransmissionContext};
use log::{debug, info};

use crate::protocol::frame::{Command, Frame, STATUS_READY, TransmissionStatus};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all transmission states.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    /// Sampling disabled.
    Idle = 0,
    /// Sampling enabled.
    Running = 1,
}

impl StateId {
    /// Total number of states: used to size the table array.
    pub const COUNT: usize = 2;

    /// Convert an index back to `StateId`.  Panics on out-of-range in
    /// debug builds; returns `Idle` in release (safe fallback).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Running,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Idle
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type StateActionFn = fn(&mut TransmissionContext);

/// Signature for the update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut TransmissionContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    pub fn start(&mut self, ctx: &mut TransmissionContext) {
        debug!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Evaluate the current state's `on_update` and transition if asked.
    pub fn tick(&mut self, ctx: &mut TransmissionContext) {
        let next = (self.table[self.current].on_update)(ctx);
        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Force an immediate transition.  No-op if already in `next`.
    pub fn force_transition(&mut self, next: StateId, ctx: &mut TransmissionContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    fn transition(&mut self, next_id: StateId, ctx: &mut TransmissionContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

// ---------------------------------------------------------------------------
// Transmission machine
// ---------------------------------------------------------------------------

/// Transmission state plus its command/response contract.
pub struct TransmissionMachine {
    fsm: Fsm,
    ctx: TransmissionContext,
}

impl TransmissionMachine {
    /// A machine in `Idle` with the given send-error threshold.
    pub fn new(error_threshold: u32) -> Self {
        let mut ctx = TransmissionContext::new(error_threshold);
        let mut fsm = Fsm::new(states::build_state_table(), StateId::Idle);
        fsm.start(&mut ctx);
        ctx.notices.clear();
        Self { fsm, ctx }
    }

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Whether periodic sampling is enabled.
    pub fn is_enabled(&self) -> bool {
        self.state() == StateId::Running
    }

    pub fn error_count(&self) -> u32 {
        self.ctx.error_count
    }

    pub fn error_threshold(&self) -> u32 {
        self.ctx.error_threshold
    }

    /// Apply an inbound command and return the frames to send back.
    ///
    /// A repeated `START_ADC` while running (or `STOP_ADC` while idle)
    /// re-acknowledges without touching state or the error counter.
    pub fn handle_command(&mut self, cmd: &Command) -> Vec<Frame> {
        match cmd {
            Command::StartAdc => {
                if self.is_enabled() {
                    debug!("START_ADC while running; re-acknowledging");
                    return vec![Frame::Transmission(TransmissionStatus::Started)];
                }
                self.fsm.force_transition(StateId::Running, &mut self.ctx);
                self.drain_frames()
            }
            Command::StopAdc => {
                if !self.is_enabled() {
                    debug!("STOP_ADC while idle; re-acknowledging");
                    return vec![Frame::Transmission(TransmissionStatus::Stopped)];
                }
                self.ctx.stop_reason = StopReason::Requested;
                self.fsm.force_transition(StateId::Idle, &mut self.ctx);
                self.drain_frames()
            }
            Command::Status | Command::Hello => vec![self.status_frame()],
            Command::Ping => vec![Frame::Pong],
            Command::Text(text) => vec![Frame::Ack(text.trim().to_string())],
        }
    }

    /// `SYSTEM_STATUS:READY,<ENABLED|DISABLED>` for the current state.
    pub fn status_frame(&self) -> Frame {
        Frame::SystemStatus {
            status: STATUS_READY.to_string(),
            enabled: Some(self.is_enabled()),
        }
    }

    /// Record one failed sample transmission.
    ///
    /// Returns `Some(Error)` exactly once: on the failure that reaches the
    /// threshold.  Failures while idle are not counted.
    pub fn record_send_failure(&mut self) -> Option<TransmissionStatus> {
        if !self.is_enabled() {
            return None;
        }
        self.ctx.error_count = self.ctx.error_count.saturating_add(1);
        debug!(
            "Send failure {}/{}",
            self.ctx.error_count, self.ctx.error_threshold
        );
        self.fsm.tick(&mut self.ctx);
        self.ctx.notices.drain(..).last()
    }

    /// Mirror a status reported by the remote node.
    ///
    /// Returns `true` if the local state changed.
    pub fn apply_remote(&mut self, status: TransmissionStatus) -> bool {
        let before = self.state();
        match status {
            TransmissionStatus::Started => {
                self.fsm.force_transition(StateId::Running, &mut self.ctx);
            }
            TransmissionStatus::Stopped => {
                self.ctx.stop_reason = StopReason::Requested;
                self.fsm.force_transition(StateId::Idle, &mut self.ctx);
            }
            TransmissionStatus::Error => {
                self.ctx.stop_reason = StopReason::Fault;
                self.fsm.force_transition(StateId::Idle, &mut self.ctx);
            }
        }
        self.ctx.notices.clear();
        before != self.state()
    }

    /// Silently return to `Idle` (session teardown).
    pub fn reset(&mut self) {
        self.ctx.stop_reason = StopReason::Reset;
        self.fsm.force_transition(StateId::Idle, &mut self.ctx);
        self.ctx.error_count = 0;
        self.ctx.notices.clear();
    }

    fn drain_frames(&mut self) -> Vec<Frame> {
        self.ctx.notices.drain(..).map(Frame::Transmission).collect()
    }
}
