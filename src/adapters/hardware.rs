//! Hardware adapter: bridges the real peripherals to domain port traits.
//!
//! Owns the ADC and the time source, exposing them together as one
//! `AnalogPort + DelayNs + ClockPort` value for the
//! [`GasMonitor`](crate::app::service::GasMonitor).  This is the only
//! module in the system that touches sensing hardware.  On non-espidf
//! targets the underlying adapters use cfg-gated simulation stubs.

use embedded_hal::delay::DelayNs;

use super::analog::AdcAdapter;
use super::time::Esp32TimeAdapter;
use crate::app::ports::{AnalogPort, ClockPort};

/// Concrete adapter that combines the sensing hardware behind port traits.
pub struct HardwareAdapter {
    adc: AdcAdapter,
    time: Esp32TimeAdapter,
}

impl HardwareAdapter {
    pub fn new(adc: AdcAdapter, time: Esp32TimeAdapter) -> Self {
        Self { adc, time }
    }
}

// ── AnalogPort ────────────────────────────────────────────────

impl AnalogPort for HardwareAdapter {
    fn read_raw(&mut self) -> i32 {
        self.adc.read_raw()
    }
}

// ── Clock + delay ─────────────────────────────────────────────

impl ClockPort for HardwareAdapter {
    fn now_ms(&self) -> u64 {
        self.time.now_ms()
    }
}

impl DelayNs for HardwareAdapter {
    fn delay_ns(&mut self, ns: u32) {
        self.time.delay_ns(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.time.delay_ms(ms);
    }
}
