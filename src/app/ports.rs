//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ GasMonitor (domain)
//! ```
//!
//! Driven adapters (ADC, clock, emulated EEPROM, event sinks, config
//! storage) implement these traits.  The
//! [`GasMonitor`](super::service::GasMonitor) consumes them via generics,
//! so the engine never touches hardware directly.
//!
//! Blocking waits go through [`embedded_hal::delay::DelayNs`]; tests inject
//! a delay that only advances a simulated clock.

use crate::config::SensorConfig;

// ───────────────────────────────────────────────────────────────
// Analog input port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One-shot conversions from the sensor's analog channel.
pub trait AnalogPort {
    /// Raw conversion result.  Values outside `0..=adc_max` (including the
    /// negative values some drivers use for a failed conversion) are
    /// discarded by the sampler.
    fn read_raw(&mut self) -> i32;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic elapsed-time source polled by the control step.
pub trait ClockPort {
    /// Milliseconds since an arbitrary fixed origin (normally boot).
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / console)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide how they are rendered.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Byte storage port (driven adapter: domain ↔ flash)
// ───────────────────────────────────────────────────────────────

/// Byte-addressable persistent store in the style of an emulated EEPROM.
///
/// Writes land in a RAM image and become durable on [`commit`]; the commit
/// is the atomicity boundary.
///
/// [`commit`]: EepromPort::commit
pub trait EepromPort {
    /// Map `size` bytes.  Idempotent for the same size.
    fn begin(&mut self, size: usize) -> Result<(), StorageError>;

    /// Fill `buf` from `offset`.
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Stage `data` at `offset`.
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError>;

    /// Flush staged writes to the medium.
    fn commit(&mut self) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists [`SensorConfig`].
///
/// Implementations MUST validate before persisting and reject invalid
/// values with [`ConfigError::ValidationFailed`] rather than clamping.
pub trait ConfigPort {
    /// Load configuration; [`SensorConfig::default()`] if none is stored.
    fn load(&self) -> Result<SensorConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SensorConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`EepromPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Access before [`EepromPort::begin`].
    NotInitialised,
    /// Offset plus length exceeds the mapped size.
    OutOfBounds,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotInitialised => write!(f, "storage not initialised"),
            Self::OutOfBounds => write!(f, "access out of bounds"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
