//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch.
//!
//! ```text
//!  IDLE ──[START_ADC]──▶ RUNNING
//!    ▲                      │
//!    ├──────[STOP_ADC]──────┤
//!    │                      │
//!    └──[errors >= limit]───┘
//! ```

use super::context::{StopReason, TransmissionContext};
use super::{StateDescriptor, StateId};
use crate::protocol::frame::TransmissionStatus;
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once per machine.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1: Running
        StateDescriptor {
            id: StateId::Running,
            name: "Running",
            on_enter: Some(running_enter),
            on_exit: None,
            on_update: running_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut TransmissionContext) {
    match ctx.stop_reason {
        StopReason::Requested => {
            info!("IDLE: transmission stopped on request");
            ctx.notices.push(TransmissionStatus::Stopped);
        }
        StopReason::Fault => {
            warn!(
                "IDLE: transmission forced off after {} send errors",
                ctx.error_count
            );
            ctx.notices.push(TransmissionStatus::Error);
        }
        StopReason::Reset => {
            info!("IDLE: transmission state reset");
        }
    }
}

fn idle_update(_ctx: &mut TransmissionContext) -> Option<StateId> {
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  RUNNING state
// ═══════════════════════════════════════════════════════════════════════════

fn running_enter(ctx: &mut TransmissionContext) {
    ctx.error_count = 0;
    ctx.notices.push(TransmissionStatus::Started);
    info!("RUNNING: sampling enabled");
}

fn running_update(ctx: &mut TransmissionContext) -> Option<StateId> {
    if ctx.threshold_reached() {
        ctx.stop_reason = StopReason::Fault;
        return Some(StateId::Idle);
    }
    None
}
