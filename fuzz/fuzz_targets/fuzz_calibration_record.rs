//! Fuzz target: calibration record decoding
//!
//! Loads arbitrary 8-byte images through `CalibrationStore::load` and
//! asserts that any R0 it accepts is finite and inside the plausible
//! range, and that it agrees with `PersistedRecord` decoding.
//!
//! cargo fuzz run fuzz_calibration_record

#![no_main]

use gasmon::app::ports::{EepromPort, StorageError};
use gasmon::calibration::{CalibrationStore, PersistedRecord, R0_MAX_KOHM, R0_MIN_KOHM};
use libfuzzer_sys::fuzz_target;

struct Image(Vec<u8>);

impl EepromPort for Image {
    fn begin(&mut self, size: usize) -> Result<(), StorageError> {
        self.0.resize(size, 0);
        Ok(())
    }
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        let src = self.0.get(offset..offset + buf.len()).ok_or(StorageError::OutOfBounds)?;
        buf.copy_from_slice(src);
        Ok(())
    }
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        let dst = self.0.get_mut(offset..offset + data.len()).ok_or(StorageError::OutOfBounds)?;
        dst.copy_from_slice(data);
        Ok(())
    }
    fn commit(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

fuzz_target!(|data: [u8; 8]| {
    let mut store = CalibrationStore::new(Image(data.to_vec()));
    let loaded = store.load();
    if let Some(r0) = loaded {
        assert!(r0.is_finite());
        assert!(r0 > R0_MIN_KOHM && r0 < R0_MAX_KOHM);
    }
    assert_eq!(loaded, PersistedRecord::from_bytes(data).r0());

    // Clearing always leaves nothing to load.
    store.clear().unwrap();
    assert_eq!(store.load(), None);
});
