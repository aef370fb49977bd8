//! Application service: the lifecycle controller.
//!
//! [`GasMonitor`] owns the FSM, the [`EngineState`](crate::fsm::context::EngineState)
//! and the read timer.  All I/O flows through port traits injected at call
//! sites, so the whole engine runs against mock adapters in tests.
//!
//! ```text
//!  AnalogPort ─┐   ┌─────────────────────────────┐
//!  DelayNs    ─┼──▶│          GasMonitor          │──▶ EventSink
//!  ClockPort  ─┘   │ FSM · Sampler · Curves · R0  │
//!                  └──────────────┬──────────────┘
//!                                 ▼
//!                      CalibrationStore<EepromPort>
//! ```
//!
//! Everything is single-threaded and cooperative: the main loop calls
//! [`GasMonitor::step`] repeatedly; sampling and calibration block inside
//! their fixed delays and cannot be cancelled.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::calibration::CalibrationStore;
use crate::config::SensorConfig;
use crate::error::{CalibrationError, StoreError};
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::scheduler::IntervalTimer;
use crate::sensors::{GasSensor, resistance};

use super::commands::{AppCommand, parse_line};
use super::events::{AppEvent, DeferReason, StatusInfo};
use super::ports::{AnalogPort, ClockPort, EepromPort, EventSink};

/// Calibration progress is reported every this many attempts.
const PROGRESS_EVERY: u16 = 10;

// ───────────────────────────────────────────────────────────────
// GasMonitor
// ───────────────────────────────────────────────────────────────

/// The lifecycle controller orchestrating sampling, calibration and reads.
pub struct GasMonitor {
    fsm: Fsm,
    ctx: FsmContext,
    sensor: GasSensor,
    read_timer: IntervalTimer,
    reads_ok: u32,
    reads_failed: u32,
}

impl GasMonitor {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: SensorConfig) -> Self {
        let sensor = GasSensor::new(&config);
        let read_timer = IntervalTimer::new("read", config.read_interval_ms);
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Booting);
        Self {
            fsm,
            ctx,
            sensor,
            read_timer,
            reads_ok: 0,
            reads_failed: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Boot: load the stored R0, enter Preheating, and optionally calibrate.
    pub fn start<H, E>(
        &mut self,
        hw: &mut H,
        store: &mut CalibrationStore<E>,
        sink: &mut impl EventSink,
    ) where
        H: AnalogPort + DelayNs + ClockPort,
        E: EepromPort,
    {
        let now = hw.now_ms();
        self.ctx.now_ms = now;
        self.ctx.boot_ms = now;
        self.fsm.start(&mut self.ctx);
        self.read_timer.restart(now);

        let loaded = store
            .load()
            .filter(|&r0| self.ctx.engine.set_calibrated(r0));
        match loaded {
            Some(r0) => {
                info!("Loaded calibration: R0 = {:.3} kΩ", r0);
                sink.emit(&AppEvent::CalibrationLoaded { r0_kohm: r0 });
            }
            _ => {
                warn!("No valid calibration stored");
                sink.emit(&AppEvent::CalibrationMissing);
            }
        }

        self.fsm.force_transition(StateId::Preheating, &mut self.ctx);
        sink.emit(&AppEvent::Started {
            state: self.fsm.current_state(),
            calibrated: self.ctx.engine.calibrated,
        });

        if !self.ctx.engine.calibrated && self.ctx.config.calibrate_on_boot {
            info!("calibrate_on_boot set, running calibration");
            // Failure is already reported through the sink.
            let _ = self.calibrate(hw, store, sink);
        }
    }

    // ── Per-step orchestration ────────────────────────────────

    /// One cooperative control step: poll time, advance the lifecycle, and
    /// run a read cycle when the read timer fires and gating allows it.
    pub fn step<H>(&mut self, hw: &mut H, sink: &mut impl EventSink)
    where
        H: AnalogPort + DelayNs + ClockPort,
    {
        let now = hw.now_ms();
        self.advance(now, sink);

        if !self.read_timer.poll(now) {
            return;
        }

        let r0 = match self.gate() {
            Ok(r0) => r0,
            Err(reason) => {
                sink.emit(&AppEvent::ReadDeferred(reason));
                return;
            }
        };

        match self.sensor.read(hw, r0, now) {
            Ok(reading) => {
                self.reads_ok = self.reads_ok.wrapping_add(1);
                sink.emit(&AppEvent::Reading(reading));
            }
            Err(e) => {
                self.reads_failed = self.reads_failed.wrapping_add(1);
                warn!("Read cycle skipped: {}", e);
                sink.emit(&AppEvent::SampleFailed(e));
            }
        }
    }

    /// Poll the clock into the context and tick the lifecycle.
    fn advance(&mut self, now: u64, sink: &mut impl EventSink) {
        self.ctx.now_ms = now;

        let prev = self.fsm.current_state();
        self.fsm.tick(&mut self.ctx);
        let state = self.fsm.current_state();
        if state != prev {
            sink.emit(&AppEvent::StateChanged {
                from: prev,
                to: state,
            });
        }
    }

    /// R0 if a reading is permitted right now.
    fn gate(&self) -> Result<f32, DeferReason> {
        if self.fsm.current_state() != StateId::Ready {
            return Err(DeferReason::NotPreheated);
        }
        self.ctx.engine.r0().ok_or(DeferReason::NotCalibrated)
    }

    // ── Command handling ──────────────────────────────────────

    /// Parse and execute one console line.  Blank lines are ignored.
    pub fn handle_line<H, E>(
        &mut self,
        line: &str,
        hw: &mut H,
        store: &mut CalibrationStore<E>,
        sink: &mut impl EventSink,
    ) where
        H: AnalogPort + DelayNs + ClockPort,
        E: EepromPort,
    {
        match parse_line(line) {
            None => {}
            Some(Ok(cmd)) => self.handle_command(cmd, hw, store, sink),
            Some(Err(unknown)) => sink.emit(&AppEvent::UnknownCommand(unknown)),
        }
    }

    /// Process an external command.
    pub fn handle_command<H, E>(
        &mut self,
        cmd: AppCommand,
        hw: &mut H,
        store: &mut CalibrationStore<E>,
        sink: &mut impl EventSink,
    ) where
        H: AnalogPort + DelayNs + ClockPort,
        E: EepromPort,
    {
        match cmd {
            AppCommand::Calibrate => {
                // Outcome is reported through the sink.
                let _ = self.calibrate(hw, store, sink);
            }
            AppCommand::Reset => {
                let _ = self.reset(store, sink);
            }
            AppCommand::Info => {
                self.advance(hw.now_ms(), sink);
                sink.emit(&AppEvent::Status(self.status()));
            }
        }
    }

    /// Clean-air calibration.
    ///
    /// Takes `calibration_samples` sampling passes `calibration_delay_ms`
    /// apart, averages the Rs of every successful pass, and derives R0 from
    /// the clean-air ratio.  The run is rejected, leaving R0 and the
    /// calibrated flag untouched, when fewer than `calibration_min_accepted`
    /// passes succeed or the result cannot be persisted.
    pub fn calibrate<H, E>(
        &mut self,
        hw: &mut H,
        store: &mut CalibrationStore<E>,
        sink: &mut impl EventSink,
    ) -> Result<f32, CalibrationError>
    where
        H: AnalogPort + DelayNs + ClockPort,
        E: EepromPort,
    {
        let cfg = &self.ctx.config;
        let attempts = cfg.calibration_samples;
        let required = cfg.calibration_min_accepted;
        let delay_ms = cfg.calibration_delay_ms;
        let clean_air_ratio = cfg.clean_air_ratio;

        if !self.ctx.engine.preheated {
            warn!("Calibrating before preheat finished; R0 may be off");
        }
        info!("Calibration: {} passes, keep sensor in clean air", attempts);
        sink.emit(&AppEvent::CalibrationStarted { attempts });

        let mut rs_sum = 0.0f32;
        let mut accepted: u16 = 0;
        for attempt in 1..=attempts {
            match self.sensor.measure_rs(hw) {
                Ok((_, rs)) => {
                    rs_sum += rs;
                    accepted += 1;
                }
                Err(e) => log::debug!("Calibration pass {} failed: {}", attempt, e),
            }
            if attempt % PROGRESS_EVERY == 0 {
                sink.emit(&AppEvent::CalibrationProgress { attempt, accepted });
            }
            if attempt < attempts {
                hw.delay_ms(delay_ms);
            }
        }

        let result = if accepted < required {
            Err(CalibrationError::InsufficientSamples { accepted, required })
        } else {
            resistance::to_r0(rs_sum / f32::from(accepted), clean_air_ratio)
                .ok_or(CalibrationError::Store(StoreError::Range))
                .and_then(|r0| store.save(r0).map(|()| r0).map_err(CalibrationError::from))
        };

        self.ctx.now_ms = hw.now_ms();
        match result {
            Ok(r0) => {
                self.ctx.engine.set_calibrated(r0);
                info!(
                    "Calibration complete: R0 = {:.3} kΩ from {} passes",
                    r0, accepted
                );
                sink.emit(&AppEvent::Calibrated {
                    r0_kohm: r0,
                    accepted,
                });
            }
            Err(e) => {
                warn!("Calibration failed: {}", e);
                sink.emit(&AppEvent::CalibrationFailed(e));
            }
        }
        result
    }

    /// Erase the stored calibration and drop to Uncalibrated.
    ///
    /// The flag is cleared even when the erase fails, so no reading is made
    /// against an R0 the user asked to discard.
    pub fn reset<E: EepromPort>(
        &mut self,
        store: &mut CalibrationStore<E>,
        sink: &mut impl EventSink,
    ) -> Result<(), StoreError> {
        self.ctx.engine.clear_calibration();
        match store.clear() {
            Ok(()) => {
                info!("Calibration reset");
                sink.emit(&AppEvent::CalibrationCleared);
                Ok(())
            }
            Err(e) => {
                warn!("Calibration reset: storage erase failed: {}", e);
                sink.emit(&AppEvent::ResetFailed(e));
                Err(e)
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Status as of the last polled time.
    pub fn status(&self) -> StatusInfo {
        let now = self.ctx.now_ms;
        StatusInfo {
            state: self.fsm.current_state(),
            calibrated: self.ctx.engine.calibrated,
            r0_kohm: self.ctx.engine.r0(),
            uptime_ms: self.ctx.uptime_ms(),
            preheat_remaining_ms: self.ctx.preheat_remaining_ms(),
            next_read_in_ms: self.read_timer.remaining_ms(now),
            reads_ok: self.reads_ok,
            reads_failed: self.reads_failed,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn is_calibrated(&self) -> bool {
        self.ctx.engine.calibrated
    }

    pub fn is_preheated(&self) -> bool {
        self.ctx.engine.preheated
    }

    /// R0 when calibrated.
    pub fn r0_kohm(&self) -> Option<f32> {
        self.ctx.engine.r0()
    }

    pub fn config(&self) -> &SensorConfig {
        &self.ctx.config
    }
}
