//! Raw ADC count to centred, scaled signal.

/// Linear mapping that centres the converter range on zero.
///
/// `normalized = (raw - adc_max / 2) / adc_max * scale`, so a full-range
/// input spans `[-scale/2, scale/2]`.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    adc_max: f32,
    scale: f32,
}

impl Normalizer {
    pub fn new(adc_max: u16, scale: f32) -> Self {
        Self {
            adc_max: f32::from(adc_max.max(1)),
            scale,
        }
    }

    pub fn apply(&self, raw: u16) -> f32 {
        (f32::from(raw) - self.adc_max / 2.0) / self.adc_max * self.scale
    }
}
