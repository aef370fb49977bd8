//! Polled interval timer for periodic read cycles.
//!
//! The control step calls [`IntervalTimer::poll`] with the current time;
//! the timer reports `true` once per elapsed interval and rearms from the
//! poll time.  There are no callbacks or interrupts: a slow control step
//! (for example a 20 s calibration run) simply results in one late fire,
//! never a burst of catch-up fires.

use log::debug;

/// Fixed-interval schedule driven by a monotonic millisecond clock.
#[derive(Debug, Clone, Copy)]
pub struct IntervalTimer {
    label: &'static str,
    interval_ms: u64,
    last_fire_ms: u64,
    fired: u64,
}

impl IntervalTimer {
    pub fn new(label: &'static str, interval_ms: u32) -> Self {
        Self {
            label,
            interval_ms: u64::from(interval_ms.max(1)),
            last_fire_ms: 0,
            fired: 0,
        }
    }

    /// Restart the interval from `now_ms`.
    pub fn restart(&mut self, now_ms: u64) {
        self.last_fire_ms = now_ms;
    }

    /// `true` when at least one interval has passed since the last fire.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_fire_ms) < self.interval_ms {
            return false;
        }
        self.last_fire_ms = now_ms;
        self.fired += 1;
        debug!("Scheduler: '{}' fired (#{})", self.label, self.fired);
        true
    }

    /// Milliseconds until the next fire; zero if already due.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.interval_ms
            .saturating_sub(now_ms.saturating_sub(self.last_fire_ms))
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Number of fires since construction.
    pub fn fire_count(&self) -> u64 {
        self.fired
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
