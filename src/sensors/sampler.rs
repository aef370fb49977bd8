//! Multi-sample ADC voltage acquisition with outlier rejection.
//!
//! One sampling pass reads the MQ-135 output `sample_count` times, drops
//! readings outside the converter's digital range, then averages only the
//! samples that sit within 1.5σ of the raw mean.  A pass either yields a
//! single filtered voltage or a [`SampleError`]; nothing is retained
//! between passes.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::debug;

use crate::app::ports::AnalogPort;
use crate::config::SensorConfig;
use crate::error::SampleError;

/// Maximum raw readings held by one [`SampleWindow`].
pub const WINDOW_CAPACITY: usize = 64;

/// In-range readings required before statistics are attempted.
pub const MIN_VALID_SAMPLES: usize = 5;

/// Samples that must survive outlier rejection.
pub const MIN_INLIERS: usize = 3;

/// Inlier band half-width, in standard deviations.
pub const OUTLIER_SIGMA: f32 = 1.5;

/// Filtered means at or below this are treated as a disconnected sensor.
pub const MIN_PLAUSIBLE_VOLTS: f32 = 0.05;

/// Filtered means at or above this are treated as a saturated input.
pub const MAX_PLAUSIBLE_VOLTS: f32 = 4.95;

/// Voltages captured within a single sampling pass.
pub type SampleWindow = Vec<f32, WINDOW_CAPACITY>;

/// Sampling parameters derived from [`SensorConfig`].
#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    sample_count: u16,
    sample_delay_ms: u32,
    adc_max: u16,
    adc_ref_volts: f32,
}

impl Sampler {
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            sample_count: config.sample_count.min(WINDOW_CAPACITY as u16),
            sample_delay_ms: config.sample_delay_ms,
            adc_max: config.adc_max,
            adc_ref_volts: config.adc_ref_volts,
        }
    }

    /// Run one sampling pass and return the outlier-filtered mean voltage.
    pub fn sample(&self, hw: &mut (impl AnalogPort + DelayNs)) -> Result<f32, SampleError> {
        let window = self.capture(hw);
        filtered_mean(&window)
    }

    /// Read `sample_count` raw values, keeping only in-range conversions.
    pub fn capture(&self, hw: &mut (impl AnalogPort + DelayNs)) -> SampleWindow {
        let mut window = SampleWindow::new();
        for i in 0..self.sample_count {
            if i > 0 && self.sample_delay_ms > 0 {
                hw.delay_ms(self.sample_delay_ms);
            }
            let raw = hw.read_raw();
            if raw < 0 || raw > i32::from(self.adc_max) {
                debug!("sampler: discarding out-of-range raw {}", raw);
                continue;
            }
            if window.push(self.raw_to_volts(raw)).is_err() {
                break;
            }
        }
        window
    }

    /// Scale a raw count onto the logical `0..=adc_ref_volts` range.
    pub fn raw_to_volts(&self, raw: i32) -> f32 {
        raw as f32 * self.adc_ref_volts / f32::from(self.adc_max)
    }
}

/// Mean of the samples lying within [`OUTLIER_SIGMA`] standard deviations.
///
/// Fails when fewer than [`MIN_VALID_SAMPLES`] are supplied, fewer than
/// [`MIN_INLIERS`] survive, or the result falls outside the open interval
/// (`MIN_PLAUSIBLE_VOLTS`, `MAX_PLAUSIBLE_VOLTS`).
pub fn filtered_mean(samples: &[f32]) -> Result<f32, SampleError> {
    if samples.len() < MIN_VALID_SAMPLES {
        return Err(SampleError::TooFewValid {
            valid: samples.len(),
        });
    }

    let n = samples.len() as f32;
    let mean = samples.iter().sum::<f32>() / n;
    let variance = samples.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
    let limit = OUTLIER_SIGMA * variance.sqrt();

    let (sum, inliers) = samples
        .iter()
        .filter(|v| (*v - mean).abs() <= limit)
        .fold((0.0f32, 0usize), |(s, c), v| (s + v, c + 1));

    if inliers < MIN_INLIERS {
        return Err(SampleError::TooFewInliers { inliers });
    }

    let volts = sum / inliers as f32;
    if !(volts > MIN_PLAUSIBLE_VOLTS && volts < MAX_PLAUSIBLE_VOLTS) {
        return Err(SampleError::VoltageOutOfRange { volts });
    }

    debug!(
        "sampler: mean={:.4} V sigma={:.4} inliers={}/{} filtered={:.4} V",
        mean,
        variance.sqrt(),
        inliers,
        samples.len(),
        volts
    );
    Ok(volts)
}
