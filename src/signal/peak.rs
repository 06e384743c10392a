//! Peak detection and heart-rate estimation.
//!
//! A peak is a rise of more than `hysteresis` volts over the previous
//! sample.  Accepted peaks are spaced by at least the refractory period,
//! and the rate is derived from the interval between consecutive accepted
//! peaks.

use log::debug;
use serde::{Deserialize, Serialize};

/// Lowest plausible rate; anything slower is treated as noise.
pub const MIN_BPM: u16 = 30;
/// Highest plausible rate.
pub const MAX_BPM: u16 = 200;

/// Accepted peaks needed before the first rate is computed.
const MIN_PEAKS_FOR_ESTIMATE: u32 = 3;

/// A heart-rate estimate, always within `MIN_BPM..=MAX_BPM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpmEstimate {
    pub bpm: u16,
}

impl BpmEstimate {
    /// Rate for a beat interval, if it is physiologically plausible.
    pub fn from_interval_ms(interval_ms: u64) -> Option<Self> {
        if interval_ms == 0 {
            return None;
        }
        let bpm = (60_000.0 / interval_ms as f64).round();
        if bpm >= f64::from(MIN_BPM) && bpm <= f64::from(MAX_BPM) {
            Some(Self { bpm: bpm as u16 })
        } else {
            None
        }
    }
}

/// Running peak-detector state.  Reset when transmission stops or the
/// session disconnects.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeakState {
    pub last_voltage: f32,
    pub peak_count: u32,
    pub last_peak_time_ms: u64,
    /// Last accepted estimate; kept when a new interval is out of range.
    pub estimate: Option<BpmEstimate>,
}

impl PeakState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Peak detector parameters.
#[derive(Debug, Clone, Copy)]
pub struct PeakDetector {
    pub hysteresis: f32,
    pub refractory_ms: u64,
}

impl PeakDetector {
    /// Advance `state` with one sample and return the current estimate.
    pub fn update(&self, state: &mut PeakState, voltage: f32, now_ms: u64) -> Option<BpmEstimate> {
        let rising = voltage > state.last_voltage + self.hysteresis;
        if rising && state.last_voltage > 0.0 {
            let interval_ms = now_ms.saturating_sub(state.last_peak_time_ms);
            if interval_ms > self.refractory_ms {
                state.peak_count = state.peak_count.saturating_add(1);
                state.last_peak_time_ms = now_ms;

                if state.peak_count >= MIN_PEAKS_FOR_ESTIMATE {
                    match BpmEstimate::from_interval_ms(interval_ms) {
                        Some(estimate) => {
                            debug!("Peak #{}: {} bpm", state.peak_count, estimate.bpm);
                            state.estimate = Some(estimate);
                        }
                        None => {
                            debug!("Peak #{}: interval {}ms out of range", state.peak_count, interval_ms);
                        }
                    }
                }
            }
        }
        state.last_voltage = voltage;
        state.estimate
    }
}
