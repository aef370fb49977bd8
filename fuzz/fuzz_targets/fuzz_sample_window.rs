//! Fuzz target: `filtered_mean`
//!
//! Feeds arbitrary f32 windows (NaN and infinities included) into the
//! outlier filter and asserts that any accepted voltage is finite and
//! inside the plausible output range.
//!
//! cargo fuzz run fuzz_sample_window

#![no_main]

use gasmon::sensors::sampler::{MAX_PLAUSIBLE_VOLTS, MIN_PLAUSIBLE_VOLTS, filtered_mean};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let samples: Vec<f32> = data
        .chunks_exact(4)
        .take(64)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    if let Ok(volts) = filtered_mean(&samples) {
        assert!(volts.is_finite());
        assert!(volts > MIN_PLAUSIBLE_VOLTS && volts < MAX_PLAUSIBLE_VOLTS);
    }
});
