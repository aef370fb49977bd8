//! Concrete state handler functions and table builder.
//!
//! ```text
//!  BOOTING ──[first tick]──▶ PREHEATING ──[uptime ≥ preheat]──▶ READY
//! ```
//!
//! READY is terminal for the process lifetime.  Calibration is an
//! orthogonal flag in [`EngineState`](super::context::EngineState) and
//! never moves the machine.

use super::context::FsmContext;
use super::{StateDescriptor, StateId};
use log::info;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Booting
        StateDescriptor {
            id: StateId::Booting,
            name: "Booting",
            on_enter: None,
            on_exit: None,
            on_update: booting_update,
        },
        // Index 1: Preheating
        StateDescriptor {
            id: StateId::Preheating,
            name: "Preheating",
            on_enter: Some(preheating_enter),
            on_exit: None,
            on_update: preheating_update,
        },
        // Index 2: Ready
        StateDescriptor {
            id: StateId::Ready,
            name: "Ready",
            on_enter: Some(ready_enter),
            on_exit: None,
            on_update: ready_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  BOOTING
// ═══════════════════════════════════════════════════════════════════════════

fn booting_update(_ctx: &mut FsmContext) -> Option<StateId> {
    Some(StateId::Preheating)
}

// ═══════════════════════════════════════════════════════════════════════════
//  PREHEATING: heater warm-up, readings suppressed
// ═══════════════════════════════════════════════════════════════════════════

fn preheating_enter(ctx: &mut FsmContext) {
    info!(
        "PREHEATING: sensor warming up, {} s remaining",
        ctx.preheat_remaining_ms() / 1000
    );
}

fn preheating_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.uptime_ms() >= u64::from(ctx.config.preheat_ms) {
        return Some(StateId::Ready);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  READY: readings permitted once calibrated
// ═══════════════════════════════════════════════════════════════════════════

fn ready_enter(ctx: &mut FsmContext) {
    ctx.engine.preheated = true;
    if ctx.engine.calibrated {
        info!("READY: preheat complete, R0 = {:.3} kΩ", ctx.engine.r0_kohm);
    } else {
        info!("READY: preheat complete, sensor not calibrated (send 'calibrate')");
    }
}

fn ready_update(_ctx: &mut FsmContext) -> Option<StateId> {
    None
}
