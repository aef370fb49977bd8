//! Gasmon firmware: main entry point.
//!
//! Hexagonal architecture with a cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter     Console       │
//! │  (ADC+Clock+Delay) (EventSink)    (Eeprom+Config) (line input) │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              GasMonitor (domain logic)                 │    │
//! │  │  FSM · Sampler · Resistance model · Gas curves         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  CalibrationStore (sentinel + R0 record in emulated EEPROM)    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use embedded_hal::delay::DelayNs;
use log::{info, warn};

use gasmon::adapters::analog::AdcAdapter;
use gasmon::adapters::console::Console;
use gasmon::adapters::hardware::HardwareAdapter;
use gasmon::adapters::log_sink::LogEventSink;
use gasmon::adapters::nvs::NvsAdapter;
use gasmon::adapters::time::Esp32TimeAdapter;
use gasmon::app::ports::ConfigPort;
use gasmon::app::service::GasMonitor;
use gasmon::calibration::CalibrationStore;
use gasmon::config::SensorConfig;

/// Idle time between control steps.
const LOOP_IDLE_MS: u32 = 10;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Gasmon v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running without persistence", e);
            NvsAdapter::default()
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SensorConfig::default()
        }
    };
    info!(
        "Config: {} samples/read, read every {} ms, preheat {} ms",
        config.sample_count, config.read_interval_ms, config.preheat_ms
    );

    // ── 3. Adapters ───────────────────────────────────────────
    let adc = AdcAdapter::new().map_err(|e| anyhow::anyhow!("{}", e))?;
    let mut hw = HardwareAdapter::new(adc, Esp32TimeAdapter::new());
    let mut store = CalibrationStore::new(nvs);
    let mut sink = LogEventSink::new();
    let mut console = Console::new();

    // ── 4. Start the engine ───────────────────────────────────
    let mut monitor = GasMonitor::new(config);
    monitor.start(&mut hw, &mut store, &mut sink);
    info!("Commands: calibrate | reset | info");

    // ── 5. Control loop ───────────────────────────────────────
    loop {
        if let Some(line) = console.poll_line() {
            monitor.handle_line(&line, &mut hw, &mut store, &mut sink);
        }
        monitor.step(&mut hw, &mut sink);
        hw.delay_ms(LOOP_IDLE_MS);
    }
}
