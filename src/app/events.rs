//! Outbound application events.
//!
//! The [`GasMonitor`](super::service::GasMonitor) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide how to render them (serial log, display, etc.).

use super::commands::UnknownCommand;
use crate::error::{CalibrationError, SampleError, StoreError};
use crate::fsm::StateId;
use crate::sensors::Reading;

/// Why a scheduled read cycle was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferReason {
    NotPreheated,
    NotCalibrated,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The engine has started (carries the lifecycle state and flag).
    Started { state: StateId, calibrated: bool },

    /// The lifecycle FSM moved.
    StateChanged { from: StateId, to: StateId },

    /// A valid calibration record was found at start.
    CalibrationLoaded { r0_kohm: f32 },

    /// No valid calibration record at start.
    CalibrationMissing,

    /// One completed read cycle.
    Reading(Reading),

    /// A read cycle's sampling pass failed; nothing was changed.
    SampleFailed(SampleError),

    /// A scheduled read was skipped because gating failed.
    ReadDeferred(DeferReason),

    /// A clean-air calibration run began.
    CalibrationStarted { attempts: u16 },

    /// Periodic progress through a calibration run.
    CalibrationProgress { attempt: u16, accepted: u16 },

    /// Calibration accepted and persisted.
    Calibrated { r0_kohm: f32, accepted: u16 },

    /// Calibration rejected; prior state retained.
    CalibrationFailed(CalibrationError),

    /// Stored calibration erased.
    CalibrationCleared,

    /// Erasing the stored calibration failed (engine is uncalibrated anyway).
    ResetFailed(StoreError),

    /// Reply to the `info` command.
    Status(StatusInfo),

    /// Console input that matched no command.
    UnknownCommand(UnknownCommand),
}

/// Point-in-time engine status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusInfo {
    pub state: StateId,
    pub calibrated: bool,
    pub r0_kohm: Option<f32>,
    pub uptime_ms: u64,
    pub preheat_remaining_ms: u64,
    pub next_read_in_ms: u64,
    pub reads_ok: u32,
    pub reads_failed: u32,
}
