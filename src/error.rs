//! Unified error types for the gas monitor firmware.
//!
//! Each subsystem has a small `Copy` enum; all of them convert into the
//! top-level [`Error`] so the control step can report any failure through
//! one path.  None of these are fatal: every variant leaves the previously
//! valid calibration state untouched.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible engine operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// A sampling pass produced no usable voltage.
    Sample(SampleError),
    /// A calibration run was rejected.
    Calibration(CalibrationError),
    /// The calibration record could not be written or cleared.
    Store(StoreError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sample(e) => write!(f, "sample: {e}"),
            Self::Calibration(e) => write!(f, "calibration: {e}"),
            Self::Store(e) => write!(f, "store: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sampler errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleError {
    /// Fewer in-range raw readings than the minimum.
    TooFewValid { valid: usize },
    /// Fewer samples than the minimum survived outlier rejection.
    TooFewInliers { inliers: usize },
    /// Filtered mean outside the plausible window (disconnect or saturation).
    VoltageOutOfRange { volts: f32 },
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewValid { valid } => write!(f, "only {valid} valid ADC samples"),
            Self::TooFewInliers { inliers } => {
                write!(f, "only {inliers} samples after outlier rejection")
            }
            Self::VoltageOutOfRange { volts } => {
                write!(f, "voltage {volts:.3} V out of range (sensor disconnected or saturated)")
            }
        }
    }
}

impl From<SampleError> for Error {
    fn from(e: SampleError) -> Self {
        Self::Sample(e)
    }
}

// ---------------------------------------------------------------------------
// Calibration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationError {
    /// Not enough successful samples during the clean-air run.
    InsufficientSamples { accepted: u16, required: u16 },
    /// The computed R0 could not be persisted.
    Store(StoreError),
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientSamples { accepted, required } => write!(
                f,
                "only {accepted} valid samples, at least {required} required"
            ),
            Self::Store(e) => write!(f, "could not persist R0: {e}"),
        }
    }
}

impl From<CalibrationError> for Error {
    fn from(e: CalibrationError) -> Self {
        Self::Calibration(e)
    }
}

impl From<StoreError> for CalibrationError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Calibration store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The storage backend failed to read, write or commit.
    Io,
    /// R0 outside the plausible sensor range; refused before writing.
    Range,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "storage I/O failed"),
            Self::Range => write!(f, "R0 outside plausible range"),
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
