//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the ESP-IDF
//! logger (UART / USB-CDC in production).  Each reading is rendered as one
//! human-readable line per gas, followed by a compact JSON record at debug
//! level for machine consumers tailing the console.

use log::{debug, info, warn};

use crate::app::events::{AppEvent, DeferReason};
use crate::app::ports::EventSink;
use crate::sensors::Reading;
use crate::sensors::gas::{GasId, Level};

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }

    fn render_reading(reading: &Reading) {
        let c = &reading.concentrations;
        let worst = c.worst_level();
        info!(
            "READ | V={:.3} V | Rs={:.2} kΩ | R0={:.2} kΩ | Rs/R0={:.3} | worst={}",
            reading.voltage,
            reading.rs_kohm,
            reading.r0_kohm,
            c.ratio,
            worst.label(),
        );
        if worst > Level::Ok {
            warn!("ALERT | air quality {}", worst.label());
        }
        for g in &c.gases {
            let profile = g.gas.profile();
            match g.percent {
                Some(pct) if g.gas == GasId::Co2 => info!(
                    "  {:<8} {:>10.2} {} ({:.3} %) [{}]",
                    profile.name,
                    g.ppm,
                    profile.unit,
                    pct,
                    g.level.label()
                ),
                _ => info!(
                    "  {:<8} {:>10.2} {} [{}]",
                    profile.name,
                    g.ppm,
                    profile.unit,
                    g.level.label()
                ),
            }
        }
        match serde_json::to_string(reading) {
            Ok(json) => debug!("JSON | {}", json),
            Err(e) => debug!("JSON | encode failed: {}", e),
        }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { state, calibrated } => {
                info!("START | state={:?} calibrated={}", state, calibrated);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::CalibrationLoaded { r0_kohm } => {
                info!("CAL   | loaded R0={:.3} kΩ", r0_kohm);
            }
            AppEvent::CalibrationMissing => {
                warn!("CAL   | not calibrated, send 'calibrate' in clean air");
            }
            AppEvent::Reading(reading) => Self::render_reading(reading),
            AppEvent::SampleFailed(e) => {
                warn!("READ  | skipped: {}", e);
            }
            AppEvent::ReadDeferred(DeferReason::NotPreheated) => {
                debug!("READ  | deferred, sensor preheating");
            }
            AppEvent::ReadDeferred(DeferReason::NotCalibrated) => {
                warn!("READ  | deferred, not calibrated");
            }
            AppEvent::CalibrationStarted { attempts } => {
                info!("CAL   | started, {} passes", attempts);
            }
            AppEvent::CalibrationProgress { attempt, accepted } => {
                info!("CAL   | pass {} ({} accepted)", attempt, accepted);
            }
            AppEvent::Calibrated { r0_kohm, accepted } => {
                info!("CAL   | done, R0={:.3} kΩ from {} passes", r0_kohm, accepted);
            }
            AppEvent::CalibrationFailed(e) => {
                warn!("CAL   | failed: {}", e);
            }
            AppEvent::CalibrationCleared => {
                info!("CAL   | cleared");
            }
            AppEvent::ResetFailed(e) => {
                warn!("CAL   | reset erase failed: {}", e);
            }
            AppEvent::Status(s) => {
                info!(
                    "INFO  | state={:?} calibrated={} R0={} uptime={} ms \
                     preheat_left={} ms next_read={} ms reads={}/{} failed",
                    s.state,
                    s.calibrated,
                    s.r0_kohm
                        .map_or_else(|| "-".into(), |r| format!("{:.3} kΩ", r)),
                    s.uptime_ms,
                    s.preheat_remaining_ms,
                    s.next_read_in_ms,
                    s.reads_ok,
                    s.reads_failed,
                );
            }
            AppEvent::UnknownCommand(cmd) => {
                warn!(
                    "CMD   | unknown '{}', expected calibrate | reset | info",
                    cmd.0
                );
            }
        }
    }
}
