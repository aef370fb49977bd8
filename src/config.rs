//! System configuration parameters
//!
//! All tunable parameters for the gas monitor.  Values can be overridden via
//! NVS (see [`crate::adapters::nvs`]); the defaults match the reference
//! MQ-135 breakout (10 kΩ load resistor, 12-bit ADC on a 5 V logical scale).

use serde::{Deserialize, Serialize};

use crate::sensors::sampler::WINDOW_CAPACITY;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    // --- Sampling ---
    /// Raw ADC readings taken per sampling pass
    pub sample_count: u16,
    /// Delay between raw readings (milliseconds)
    pub sample_delay_ms: u32,
    /// Full-scale ADC count (4095 for a 12-bit converter)
    pub adc_max: u16,
    /// Voltage represented by `adc_max`
    pub adc_ref_volts: f32,

    // --- Sensor model ---
    /// Load resistor between sensor output and ground (kΩ)
    pub load_resistance_kohm: f32,
    /// Rs/R0 in clean air from the datasheet curve
    pub clean_air_ratio: f32,

    // --- Lifecycle ---
    /// Heater warm-up before readings are trusted (milliseconds)
    pub preheat_ms: u32,
    /// Interval between periodic read cycles (milliseconds)
    pub read_interval_ms: u32,

    // --- Calibration ---
    /// Sampling passes attempted during a clean-air calibration
    pub calibration_samples: u16,
    /// Delay between calibration passes (milliseconds)
    pub calibration_delay_ms: u32,
    /// Successful passes required to accept a calibration run
    pub calibration_min_accepted: u16,
    /// Run a calibration at start when no stored R0 is found
    pub calibrate_on_boot: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            // Sampling
            sample_count: 20,
            sample_delay_ms: 1,
            adc_max: 4095,
            adc_ref_volts: 5.0,

            // Sensor model
            load_resistance_kohm: 10.0,
            clean_air_ratio: 3.6,

            // Lifecycle
            preheat_ms: 20_000,
            read_interval_ms: 2_000,

            // Calibration
            calibration_samples: 100,
            calibration_delay_ms: 200,
            calibration_min_accepted: 10,
            calibrate_on_boot: false,
        }
    }
}

impl SensorConfig {
    /// Range-check every field.  Returns the name of the first offending field.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.sample_count == 0 || self.sample_count as usize > WINDOW_CAPACITY {
            return Err("sample_count must be 1..=64");
        }
        if self.adc_max == 0 {
            return Err("adc_max must be non-zero");
        }
        if !(self.adc_ref_volts > 0.0) {
            return Err("adc_ref_volts must be positive");
        }
        if !(self.load_resistance_kohm > 0.0) {
            return Err("load_resistance_kohm must be positive");
        }
        if !(self.clean_air_ratio > 0.0) {
            return Err("clean_air_ratio must be positive");
        }
        if self.read_interval_ms == 0 {
            return Err("read_interval_ms must be non-zero");
        }
        if self.calibration_samples == 0 {
            return Err("calibration_samples must be non-zero");
        }
        if self.calibration_min_accepted == 0
            || self.calibration_min_accepted > self.calibration_samples
        {
            return Err("calibration_min_accepted must be 1..=calibration_samples");
        }
        Ok(())
    }
}
