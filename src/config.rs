//! Link configuration parameters
//!
//! All tunable parameters for the node loop, the viewer session and the
//! signal pipeline.  Values can be overridden from a JSON file on the host.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound on the moving-average window (sizes the filter buffer).
pub const MAX_FILTER_WINDOW: usize = 32;

/// Core link configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    // --- ADC ---
    /// Full-scale raw ADC value (e.g. 1023 for a 10-bit converter)
    pub adc_max: u16,
    /// ADC reference voltage in volts
    pub reference_voltage: f32,

    // --- Timing ---
    /// Sample tick interval (milliseconds)
    pub sample_interval_ms: u32,
    /// Heartbeat tick interval (milliseconds)
    pub heartbeat_interval_ms: u32,
    /// Delay before the single reconnect attempt (milliseconds)
    pub reconnect_delay_ms: u32,

    // --- Transmission ---
    /// Failed sample sends tolerated before transmission is forced off
    pub error_threshold: u32,

    // --- Signal pipeline ---
    /// Output span of the normalised signal
    pub normalize_scale: f32,
    /// Moving-average window (samples)
    pub filter_window: usize,
    /// Voltage rise above the previous sample that counts as a peak (volts)
    pub peak_hysteresis: f32,
    /// Minimum gap between accepted peaks (milliseconds)
    pub refractory_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            // ADC
            adc_max: 1023,
            reference_voltage: 5.0,

            // Timing
            sample_interval_ms: 100,     // 10 Hz
            heartbeat_interval_ms: 5000, // every 5 s
            reconnect_delay_ms: 1000,

            // Transmission
            error_threshold: 10,

            // Signal pipeline
            normalize_scale: 5.0,
            filter_window: 5,
            peak_hysteresis: 0.1,
            refractory_ms: 300,
        }
    }
}

impl LinkConfig {
    /// Reject values that would break the scheduler or the pipeline.
    ///
    /// Invalid ranges are rejected, not clamped.
    pub fn validate(&self) -> Result<()> {
        if self.adc_max == 0 {
            return Err(Error::Config("adc_max must be non-zero"));
        }
        if self.reference_voltage.is_nan() || self.reference_voltage <= 0.0 {
            return Err(Error::Config("reference_voltage must be positive"));
        }
        if self.sample_interval_ms == 0 || self.heartbeat_interval_ms == 0 {
            return Err(Error::Config("tick intervals must be non-zero"));
        }
        if self.error_threshold == 0 {
            return Err(Error::Config("error_threshold must be at least 1"));
        }
        if self.filter_window == 0 || self.filter_window > MAX_FILTER_WINDOW {
            return Err(Error::Config("filter_window out of range"));
        }
        if self.peak_hysteresis < 0.0 {
            return Err(Error::Config("peak_hysteresis must not be negative"));
        }
        Ok(())
    }

    /// Parse a JSON document and validate it.  Missing keys take defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|_| Error::Config("invalid JSON config"))?;
        config.validate()?;
        Ok(config)
    }

    /// Compact binary snapshot (postcard) for storing a known-good config.
    pub fn to_snapshot(&self) -> Result<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|_| Error::Config("snapshot encode failed"))
    }

    /// Restore and validate a snapshot produced by [`to_snapshot`](Self::to_snapshot).
    pub fn from_snapshot(bytes: &[u8]) -> Result<Self> {
        let config: Self =
            postcard::from_bytes(bytes).map_err(|_| Error::Config("corrupted snapshot"))?;
        config.validate()?;
        Ok(config)
    }

    /// Convert a raw ADC count to volts.
    pub fn raw_to_voltage(&self, raw: u16) -> f32 {
        f32::from(raw) * self.reference_voltage / f32::from(self.adc_max)
    }
}
