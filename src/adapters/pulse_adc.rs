//! Synthetic pulse ADC for the host simulator.
//!
//! Produces a deterministic pulse-like waveform: a flat baseline with a
//! short sharp rise once per beat period.  Good enough to exercise peak
//! detection end to end without hardware.

use crate::app::ports::AdcPort;
use crate::error::SensorError;

/// Simulated converter returning one beat-shaped reading per call.
#[derive(Debug, Clone)]
pub struct PulseAdc {
    /// Beat period, in samples.
    period: u32,
    baseline: u16,
    peak: u16,
    adc_max: u16,
    index: u32,
    /// Every `fail_every`-th read fails (0 = never).
    fail_every: u32,
}

impl PulseAdc {
    /// A waveform at `bpm` sampled every `sample_interval_ms`.
    pub fn new(bpm: u16, sample_interval_ms: u32, adc_max: u16) -> Self {
        let beat_ms = 60_000 / u32::from(bpm.max(1));
        Self {
            period: (beat_ms / sample_interval_ms.max(1)).max(2),
            baseline: adc_max / 4,
            peak: adc_max - adc_max / 8,
            adc_max,
            index: 0,
            fail_every: 0,
        }
    }

    /// Inject a read failure every `n` samples.
    pub fn with_failures(mut self, n: u32) -> Self {
        self.fail_every = n;
        self
    }

    fn value_at(&self, index: u32) -> u16 {
        match index % self.period {
            0 => self.peak,
            1 => self.baseline + (self.peak - self.baseline) / 3,
            _ => self.baseline,
        }
    }
}

impl AdcPort for PulseAdc {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        let index = self.index;
        self.index = self.index.wrapping_add(1);
        if self.fail_every > 0 && (index + 1) % self.fail_every == 0 {
            return Err(SensorError::AdcReadFailed);
        }
        Ok(self.value_at(index).min(self.adc_max))
    }
}
