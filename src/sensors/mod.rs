//! Sensor subsystem: sampling, the resistance model, and gas curves.
//!
//! [`GasSensor`] ties the three stages together and produces a
//! [`Reading`] per read cycle, which the application service hands to the
//! reporting sink.

pub mod gas;
pub mod resistance;
pub mod sampler;

use embedded_hal::delay::DelayNs;
use serde::Serialize;

use crate::app::ports::AnalogPort;
use crate::config::SensorConfig;
use crate::error::SampleError;
use gas::Concentrations;
use sampler::Sampler;

/// Result of one full sensing pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub timestamp_ms: u64,
    /// Filtered output voltage.
    pub voltage: f32,
    pub rs_kohm: f32,
    pub r0_kohm: f32,
    pub concentrations: Concentrations,
}

/// MQ-135 front end: sampler plus divider model.
#[derive(Debug, Clone, Copy)]
pub struct GasSensor {
    sampler: Sampler,
    load_resistance_kohm: f32,
}

impl GasSensor {
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            sampler: Sampler::new(config),
            load_resistance_kohm: config.load_resistance_kohm,
        }
    }

    /// Sample once and convert to `(volts, Rs)`.
    pub fn measure_rs(
        &self,
        hw: &mut (impl AnalogPort + DelayNs),
    ) -> Result<(f32, f32), SampleError> {
        let volts = self.sampler.sample(hw)?;
        let rs = resistance::to_rs(volts, self.load_resistance_kohm)
            .ok_or(SampleError::VoltageOutOfRange { volts })?;
        Ok((volts, rs))
    }

    /// Full read cycle against a known-good `r0_kohm`.
    pub fn read(
        &self,
        hw: &mut (impl AnalogPort + DelayNs),
        r0_kohm: f32,
        timestamp_ms: u64,
    ) -> Result<Reading, SampleError> {
        let (voltage, rs_kohm) = self.measure_rs(hw)?;
        Ok(Reading {
            timestamp_ms,
            voltage,
            rs_kohm,
            r0_kohm,
            concentrations: gas::evaluate(rs_kohm, r0_kohm),
        })
    }
}
