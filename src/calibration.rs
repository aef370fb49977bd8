//! Persisted R0 calibration record.
//!
//! Layout at the start of the emulated EEPROM:
//!
//! ```text
//!  offset 0..4   f32 LE  sentinel (CALIBRATION_MAGIC)
//!  offset 4..8   f32 LE  R0 in kΩ
//! ```
//!
//! A record is valid only when the sentinel matches within
//! [`MAGIC_TOLERANCE`] and R0 lies inside the plausible sensor range.
//! Anything else reads back as "never calibrated".

use log::{info, warn};

use crate::app::ports::{EepromPort, StorageError};
use crate::error::StoreError;

/// Bytes mapped from the storage medium.
pub const EEPROM_SIZE: usize = 512;

/// Offset of the record inside the mapped region.
pub const RECORD_OFFSET: usize = 0;

/// Bytes occupied by [`PersistedRecord`].
pub const RECORD_LEN: usize = 8;

/// Sentinel written ahead of R0.
pub const CALIBRATION_MAGIC: f32 = 12_345.678;

/// Allowed drift between the stored and expected sentinel.
pub const MAGIC_TOLERANCE: f32 = 0.01;

/// Exclusive lower bound of a plausible R0 (kΩ).
pub const R0_MIN_KOHM: f32 = 0.1;

/// Exclusive upper bound of a plausible R0 (kΩ).
pub const R0_MAX_KOHM: f32 = 100.0;

/// Whether `r0` is a value a healthy MQ-135 could produce.
pub fn is_plausible_r0(r0_kohm: f32) -> bool {
    r0_kohm > R0_MIN_KOHM && r0_kohm < R0_MAX_KOHM
}

/// On-medium representation of the calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersistedRecord {
    pub magic: f32,
    pub r0_kohm: f32,
}

impl PersistedRecord {
    pub fn new(r0_kohm: f32) -> Self {
        Self {
            magic: CALIBRATION_MAGIC,
            r0_kohm,
        }
    }

    pub fn to_bytes(self) -> [u8; RECORD_LEN] {
        let mut out = [0u8; RECORD_LEN];
        out[..4].copy_from_slice(&self.magic.to_le_bytes());
        out[4..].copy_from_slice(&self.r0_kohm.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: [u8; RECORD_LEN]) -> Self {
        Self {
            magic: f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            r0_kohm: f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    pub fn magic_matches(&self) -> bool {
        (self.magic - CALIBRATION_MAGIC).abs() < MAGIC_TOLERANCE
    }

    /// R0 if the record is valid.
    pub fn r0(&self) -> Option<f32> {
        (self.magic_matches() && is_plausible_r0(self.r0_kohm)).then_some(self.r0_kohm)
    }
}

/// Owns the byte store and its calibration record.
pub struct CalibrationStore<E: EepromPort> {
    eeprom: E,
    mapped: bool,
}

impl<E: EepromPort> CalibrationStore<E> {
    pub fn new(eeprom: E) -> Self {
        Self {
            eeprom,
            mapped: false,
        }
    }

    /// Borrow the underlying store (diagnostics and tests).
    pub fn eeprom(&self) -> &E {
        &self.eeprom
    }

    pub fn eeprom_mut(&mut self) -> &mut E {
        &mut self.eeprom
    }

    fn map(&mut self) -> Result<(), StoreError> {
        if !self.mapped {
            self.eeprom.begin(EEPROM_SIZE).map_err(|e| {
                warn!("calibration: storage begin failed: {}", e);
                StoreError::Io
            })?;
            self.mapped = true;
        }
        Ok(())
    }

    /// Persist `r0_kohm` with the sentinel and commit.
    pub fn save(&mut self, r0_kohm: f32) -> Result<(), StoreError> {
        if !is_plausible_r0(r0_kohm) {
            warn!("calibration: refusing to store implausible R0 {:.3} kΩ", r0_kohm);
            return Err(StoreError::Range);
        }
        self.map()?;
        self.replace_record(PersistedRecord::new(r0_kohm).to_bytes())
            .map_err(|e| {
                warn!("calibration: save failed: {}", e);
                StoreError::Io
            })?;
        info!("calibration: stored R0 = {:.3} kΩ", r0_kohm);
        Ok(())
    }

    /// Stored R0, or `None` when absent, corrupt, or implausible.
    pub fn load(&mut self) -> Option<f32> {
        self.map().ok()?;

        let mut magic = [0u8; 4];
        self.eeprom.read(RECORD_OFFSET, &mut magic).ok()?;
        if !((f32::from_le_bytes(magic) - CALIBRATION_MAGIC).abs() < MAGIC_TOLERANCE) {
            info!("calibration: no valid record");
            return None;
        }

        let mut r0 = [0u8; 4];
        self.eeprom.read(RECORD_OFFSET + 4, &mut r0).ok()?;
        let r0 = f32::from_le_bytes(r0);
        if !is_plausible_r0(r0) {
            warn!("calibration: stored R0 {:.3} kΩ out of range, ignoring", r0);
            return None;
        }
        Some(r0)
    }

    /// Zero the record region and commit.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.map()?;
        self.replace_record([0; RECORD_LEN]).map_err(|e| {
            warn!("calibration: clear failed: {}", e);
            StoreError::Io
        })?;
        info!("calibration: record cleared");
        Ok(())
    }

    /// Write and commit `bytes` over the record.  On failure the previous
    /// record is written back so the mapped image matches the medium.
    fn replace_record(&mut self, bytes: [u8; RECORD_LEN]) -> Result<(), StorageError> {
        let mut prior = [0u8; RECORD_LEN];
        self.eeprom.read(RECORD_OFFSET, &mut prior)?;

        let result = self
            .eeprom
            .write(RECORD_OFFSET, &bytes)
            .and_then(|()| self.eeprom.commit());
        if result.is_err() && self.eeprom.write(RECORD_OFFSET, &prior).is_err() {
            warn!("calibration: could not restore previous record");
        }
        result
    }
}
