//! Moving-average smoothing over previously filtered values.
//!
//! The window averages the *filtered* output of earlier steps with the new
//! normalised input, which gives a little extra smoothing compared to a
//! plain boxcar over inputs.  Until a full window of outputs exists the
//! input passes through unchanged.

use crate::config::MAX_FILTER_WINDOW;

/// Fixed-capacity moving average.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    window: usize,
    ring: [f32; MAX_FILTER_WINDOW],
    head: usize,
    count: usize,
}

impl MovingAverage {
    /// A filter over `window` values, clamped to `1..=MAX_FILTER_WINDOW`.
    pub fn new(window: usize) -> Self {
        Self {
            window: window.clamp(1, MAX_FILTER_WINDOW),
            ring: [0.0; MAX_FILTER_WINDOW],
            head: 0,
            count: 0,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Whether the warm-up phase is over.
    pub fn is_warm(&self) -> bool {
        self.count >= self.window
    }

    /// Filter one normalised value.
    pub fn apply(&mut self, normalized: f32) -> f32 {
        let filtered = if self.is_warm() {
            // The oldest slot is the one about to be overwritten.
            let sum: f32 = (1..self.window)
                .map(|back| self.ring[(self.head + self.window - back) % self.window])
                .sum();
            (sum + normalized) / self.window as f32
        } else {
            normalized
        };

        self.ring[self.head] = filtered;
        self.head = (self.head + 1) % self.window;
        if self.count < self.window {
            self.count += 1;
        }
        filtered
    }

    /// Forget all previous outputs.
    pub fn reset(&mut self) {
        self.head = 0;
        self.count = 0;
    }
}
