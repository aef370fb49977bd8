//! ADC adapter for the MQ-135 analog output.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: ADC1 channel 6 (GPIO 34 on ESP32) via the oneshot API,
//! 12 dB attenuation, 12-bit width.
//! On host/test: reads from a static `AtomicI32` for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicI32, Ordering};

use crate::app::ports::AnalogPort;

#[cfg(not(target_os = "espidf"))]
static SIM_ADC: AtomicI32 = AtomicI32::new(0);

/// Inject the raw value returned by every host-side conversion.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(raw: i32) {
    SIM_ADC.store(raw, Ordering::Relaxed);
}

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// ADC1 channel wired to the sensor's AOUT pin.
#[cfg(target_os = "espidf")]
const SENSOR_CHANNEL: adc_channel_t = adc_channel_t_ADC_CHANNEL_6;

/// Errors while configuring the ADC unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcInitError(pub i32);

impl core::fmt::Display for AdcInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ADC1 init failed (rc={})", self.0)
    }
}

/// One-shot ADC reader for the sensor channel.
pub struct AdcAdapter {
    #[cfg(target_os = "espidf")]
    handle: adc_oneshot_unit_handle_t,
}

impl AdcAdapter {
    /// Configure ADC1 and the sensor channel.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Result<Self, AdcInitError> {
        let init_cfg = adc_oneshot_unit_init_cfg_t {
            unit_id: adc_unit_t_ADC_UNIT_1,
            ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
            ..Default::default()
        };
        let mut handle: adc_oneshot_unit_handle_t = core::ptr::null_mut();
        // SAFETY: called once from main() before the control loop starts.
        let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &mut handle) };
        if ret != ESP_OK as i32 {
            return Err(AdcInitError(ret));
        }

        let chan_cfg = adc_oneshot_chan_cfg_t {
            atten: adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        // SAFETY: `handle` was just created by adc_oneshot_new_unit.
        let ret = unsafe { adc_oneshot_config_channel(handle, SENSOR_CHANNEL, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(AdcInitError(ret));
        }

        log::info!("AdcAdapter: ADC1 CH6 configured");
        Ok(Self { handle })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self, AdcInitError> {
        log::info!("AdcAdapter: simulation backend");
        Ok(Self {})
    }
}

impl AnalogPort for AdcAdapter {
    #[cfg(target_os = "espidf")]
    fn read_raw(&mut self) -> i32 {
        let mut raw: i32 = 0;
        // SAFETY: the handle outlives self and is only used from the main task.
        let ret = unsafe { adc_oneshot_read(self.handle, SENSOR_CHANNEL, &mut raw) };
        if ret != ESP_OK as i32 {
            return -1;
        }
        raw
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_raw(&mut self) -> i32 {
        SIM_ADC.load(Ordering::Relaxed)
    }
}
