//! Periodic task scheduler for the sensor node.
//!
//! Two independent cadences share one monotonic clock.  The scheduler only
//! tracks deadlines; when a task is due it notifies a [`SchedulerDelegate`]
//! and the node loop does the actual work.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Periodic Tasks                           │
//! │                                                              │
//! │  ┌────────────────────────┐     ┌────────────────────────┐   │
//! │  │ Sample                 │     │ Heartbeat              │   │
//! │  │ every sample_interval  │     │ every heartbeat_int.   │   │
//! │  │ only while Running     │     │ always                 │   │
//! │  └───────────┬────────────┘     └───────────┬────────────┘   │
//! │              │                              │                │
//! │              ▼                              ▼                │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │              SchedulerDelegate::on_tick                │  │
//! │  └───────────────────────┬────────────────────────────────┘  │
//! │                          ▼                                   │
//! │                  NodeService (read ADC, send)                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A missed deadline fires once on the next check.  The next deadline keeps
//! the regular cadence when that is still in the future and re-arms from
//! the check time otherwise, so a stalled loop never produces a burst.

use crate::app::ports::{SchedulerDelegate, TickKind};
use crate::config::LinkConfig;
use log::{debug, info};

// ═══════════════════════════════════════════════════════════════
//  Periodic task
// ═══════════════════════════════════════════════════════════════

/// Deadline bookkeeping for one periodic task.
#[derive(Debug, Clone)]
struct PeriodicTask {
    interval_ms: u64,
    /// `None` while disarmed.
    next_due_ms: Option<u64>,
    fired: u64,
}

impl PeriodicTask {
    fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            next_due_ms: None,
            fired: 0,
        }
    }

    fn is_due(&self, now_ms: u64) -> bool {
        self.next_due_ms.is_some_and(|due| now_ms >= due)
    }

    /// Record a fire at `now_ms` and compute the next deadline.
    fn advance(&mut self, now_ms: u64) {
        let due = self.next_due_ms.unwrap_or(now_ms);
        let on_cadence = due.saturating_add(self.interval_ms);
        self.next_due_ms = Some(if on_cadence > now_ms {
            on_cadence
        } else {
            now_ms.saturating_add(self.interval_ms)
        });
        self.fired += 1;
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// The scheduler engine.
///
/// Decoupled from transmission state: the caller passes `sampling_enabled`
/// on every poll, and the scheduler invokes the [`SchedulerDelegate`]
/// instead of sending anything itself.
pub struct Scheduler {
    sample: PeriodicTask,
    heartbeat: PeriodicTask,
    started_at_ms: u64,
}

impl Scheduler {
    /// Build from configuration, with the heartbeat anchored at `now_ms`.
    pub fn new(config: &LinkConfig, now_ms: u64) -> Self {
        Self::with_intervals(
            u64::from(config.sample_interval_ms),
            u64::from(config.heartbeat_interval_ms),
            now_ms,
        )
    }

    /// Build from raw intervals.  Zero intervals are clamped to 1 ms.
    pub fn with_intervals(sample_interval_ms: u64, heartbeat_interval_ms: u64, now_ms: u64) -> Self {
        let mut heartbeat = PeriodicTask::new(heartbeat_interval_ms);
        heartbeat.next_due_ms = Some(now_ms.saturating_add(heartbeat.interval_ms));
        info!(
            "Scheduler: sample every {}ms, heartbeat every {}ms",
            sample_interval_ms, heartbeat_interval_ms
        );
        Self {
            sample: PeriodicTask::new(sample_interval_ms),
            heartbeat,
            started_at_ms: now_ms,
        }
    }

    /// Check both deadlines.  Call once per loop iteration.
    ///
    /// While `sampling_enabled` is false the sample task is disarmed; the
    /// first poll after it becomes true fires a sample immediately.
    pub fn poll(
        &mut self,
        now_ms: u64,
        sampling_enabled: bool,
        delegate: &mut dyn SchedulerDelegate,
    ) {
        if sampling_enabled {
            if self.sample.next_due_ms.is_none() {
                debug!("Scheduler: sample task armed at {}ms", now_ms);
                self.sample.next_due_ms = Some(now_ms);
            }
            if self.sample.is_due(now_ms) {
                self.sample.advance(now_ms);
                delegate.on_tick(TickKind::Sample, now_ms);
            }
        } else if self.sample.next_due_ms.take().is_some() {
            debug!("Scheduler: sample task disarmed");
        }

        if self.heartbeat.is_due(now_ms) {
            self.heartbeat.advance(now_ms);
            delegate.on_tick(TickKind::Heartbeat, now_ms);
        }
    }

    /// Whole seconds since the scheduler started.
    pub fn elapsed_secs(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_at_ms) / 1000
    }

    /// Earliest armed deadline, for callers that want to sleep until then.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        match (self.sample.next_due_ms, self.heartbeat.next_due_ms) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Number of times `kind` has fired.
    pub fn fire_count(&self, kind: TickKind) -> u64 {
        match kind {
            TickKind::Sample => self.sample.fired,
            TickKind::Heartbeat => self.heartbeat.fired,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
