//! Streaming signal pipeline: raw sample in, filtered point and heart-rate
//! estimate out.
//!
//! ```text
//!  Sample ──▶ Normalizer ──▶ MovingAverage ──▶ History<FilteredPoint>
//!    │
//!    └─ voltage ──▶ PeakDetector ──▶ Option<BpmEstimate>
//! ```
//!
//! Every stage is synchronous and allocation-free once constructed.

pub mod filter;
pub mod history;
pub mod normalize;
pub mod peak;

use serde::{Deserialize, Serialize};

use crate::config::LinkConfig;
use filter::MovingAverage;
pub use history::{DEFAULT_HISTORY_LEN, History};
use normalize::Normalizer;
pub use peak::{BpmEstimate, PeakDetector, PeakState};

/// One acquired ADC reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub raw: u16,
    pub voltage: f32,
    pub timestamp_ms: u64,
}

/// One processed display point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteredPoint {
    pub normalized: f32,
    pub filtered: f32,
}

/// Normalise, smooth and peak-detect a stream of samples.
///
/// The filter window lives inside the pipeline; peak state and history are
/// owned by the caller so they can be inspected and reset independently.
pub struct SignalPipeline {
    normalizer: Normalizer,
    filter: MovingAverage,
    detector: PeakDetector,
    processed: u64,
}

impl SignalPipeline {
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config.adc_max, config.normalize_scale),
            filter: MovingAverage::new(config.filter_window),
            detector: PeakDetector {
                hysteresis: config.peak_hysteresis,
                refractory_ms: config.refractory_ms,
            },
            processed: 0,
        }
    }

    /// Run one sample through every stage.
    ///
    /// Appends the filtered point to `history` and returns the current
    /// estimate, which is `None` until the first valid beat interval.
    pub fn process<const N: usize>(
        &mut self,
        sample: &Sample,
        state: &mut PeakState,
        history: &mut History<FilteredPoint, N>,
    ) -> Option<BpmEstimate> {
        let normalized = self.normalizer.apply(sample.raw);
        let filtered = self.filter.apply(normalized);
        history.push(FilteredPoint {
            normalized,
            filtered,
        });
        self.processed += 1;
        self.detector
            .update(state, sample.voltage, sample.timestamp_ms)
    }

    /// Restart filter warm-up.
    pub fn reset(&mut self) {
        self.filter.reset();
    }

    /// Samples processed since creation.
    pub fn processed(&self) -> u64 {
        self.processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(raw: u16, t: u64) -> Sample {
        let cfg = LinkConfig::default();
        Sample {
            raw,
            voltage: cfg.raw_to_voltage(raw),
            timestamp_ms: t,
        }
    }

    #[test]
    fn warm_up_points_are_unfiltered() {
        let cfg = LinkConfig::default();
        let mut pipe = SignalPipeline::new(&cfg);
        let mut state = PeakState::default();
        let mut history: History<FilteredPoint> = History::new();

        for (i, raw) in [100u16, 900, 300, 700].into_iter().enumerate() {
            pipe.process(&sample(raw, i as u64 * 100), &mut state, &mut history);
        }
        assert_eq!(history.len(), 4);
        assert!(history.iter().all(|p| p.filtered == p.normalized));
    }

    #[test]
    fn filtering_starts_after_window() {
        let cfg = LinkConfig::default();
        let mut pipe = SignalPipeline::new(&cfg);
        let mut state = PeakState::default();
        let mut history: History<FilteredPoint> = History::new();

        for i in 0..5u64 {
            pipe.process(&sample(512, i * 100), &mut state, &mut history);
        }
        pipe.process(&sample(1023, 500), &mut state, &mut history);
        let last = history.latest().copied().unwrap_or_default();
        assert!(last.filtered < last.normalized);
    }

    #[test]
    fn pulse_train_produces_estimate() {
        let cfg = LinkConfig::default();
        let mut pipe = SignalPipeline::new(&cfg);
        let mut state = PeakState::default();
        let mut history: History<FilteredPoint> = History::new();

        // One beat every 800 ms, sampled at 10 Hz: a spike then baseline.
        let mut estimate = None;
        for i in 0..60u64 {
            let raw = if i % 8 == 0 { 800 } else { 300 };
            estimate = pipe.process(&sample(raw, i * 100), &mut state, &mut history);
        }
        assert_eq!(estimate, Some(BpmEstimate { bpm: 75 }));
        assert_eq!(pipe.processed(), 60);
    }

    #[test]
    fn history_stays_bounded() {
        let cfg = LinkConfig::default();
        let mut pipe = SignalPipeline::new(&cfg);
        let mut state = PeakState::default();
        let mut history: History<FilteredPoint, 16> = History::new();

        for i in 0..100u64 {
            pipe.process(&sample((i % 1024) as u16, i), &mut state, &mut history);
        }
        assert_eq!(history.len(), 16);
    }
}
