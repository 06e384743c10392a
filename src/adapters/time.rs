//! Monotonic clock adapter.
//!
//! Wraps `std::time::Instant`, anchored at construction, so timestamps
//! start near zero for each run.

use std::time::Instant;

use crate::app::ports::Clock;

/// Milliseconds since the adapter was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Whole seconds since start.
    pub fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
