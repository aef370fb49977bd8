//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` holds the polled time, configuration, and the
//! [`EngineState`] (R0 and the calibrated/preheated flags).  The
//! application service is its only owner; nothing here is global.

use crate::config::SensorConfig;

// ---------------------------------------------------------------------------
// Engine state
// ---------------------------------------------------------------------------

/// Calibration and warm-up flags.
///
/// Invariant: `r0_kohm > 0` whenever `calibrated` is set.  Only a
/// successful calibration, a successful load, or an explicit reset changes
/// `r0_kohm` / `calibrated`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineState {
    pub r0_kohm: f32,
    pub calibrated: bool,
    pub preheated: bool,
}

impl EngineState {
    /// Adopt a new reference resistance.  Ignores non-positive values.
    pub fn set_calibrated(&mut self, r0_kohm: f32) -> bool {
        if !(r0_kohm > 0.0) {
            return false;
        }
        self.r0_kohm = r0_kohm;
        self.calibrated = true;
        true
    }

    pub fn clear_calibration(&mut self) {
        self.r0_kohm = 0.0;
        self.calibrated = false;
    }

    /// R0 when calibrated.
    pub fn r0(&self) -> Option<f32> {
        self.calibrated.then_some(self.r0_kohm)
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Latest polled monotonic time.
    pub now_ms: u64,
    /// Time the engine was started (preheat origin).
    pub boot_ms: u64,
    /// Time the current state was entered.
    pub state_entered_ms: u64,

    // -- Configuration --
    pub config: SensorConfig,

    // -- Engine --
    pub engine: EngineState,
}

impl FsmContext {
    /// Create a new context with the given configuration.
    pub fn new(config: SensorConfig) -> Self {
        Self {
            now_ms: 0,
            boot_ms: 0,
            state_entered_ms: 0,
            config,
            engine: EngineState::default(),
        }
    }

    /// Milliseconds since [`boot_ms`](Self::boot_ms).
    pub fn uptime_ms(&self) -> u64 {
        self.now_ms.saturating_sub(self.boot_ms)
    }

    /// Milliseconds spent in the current state.
    pub fn ms_in_state(&self) -> u64 {
        self.now_ms.saturating_sub(self.state_entered_ms)
    }

    /// Remaining warm-up time; zero once preheated.
    pub fn preheat_remaining_ms(&self) -> u64 {
        if self.engine.preheated {
            return 0;
        }
        u64::from(self.config.preheat_ms).saturating_sub(self.uptime_ms())
    }
}
