//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`EepromPort`] and [`ConfigPort`].
//!
//! - EEPROM emulation: a RAM image of the requested size is loaded from the
//!   `eeprom` blob on [`EepromPort::begin`]; writes touch only the image
//!   and [`EepromPort::commit`] stores the whole image back.  ESP-IDF NVS
//!   commits are atomic per `nvs_commit()`, so a power cut leaves either
//!   the old or the new image.
//! - Config: [`SensorConfig`] is stored as a postcard blob under `syscfg`
//!   and range-checked before persistence.
//!
//! The simulation backend keeps both blobs in memory.

use crate::app::ports::{ConfigError, ConfigPort, EepromPort, StorageError};
use crate::config::SensorConfig;
use log::{info, warn};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const NAMESPACE: &str = "gasmon";
const CONFIG_KEY: &str = "syscfg";
const EEPROM_KEY: &str = "eeprom";

/// Largest blob accepted from flash.
const MAX_BLOB_SIZE: usize = 4000;

pub struct NvsAdapter {
    /// RAM image of the emulated EEPROM; empty until `begin`.
    image: Vec<u8>,
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<&'static str, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// Returns `Err(ConfigError::IoError)` if flash initialisation fails
    /// unrecoverably. On first boot or after a version mismatch the NVS
    /// partition is erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self::unbacked())
    }

    /// Adapter with an empty image and, on host, an empty store.
    fn unbacked() -> Self {
        Self {
            image: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        }
    }

    fn check_range(&self, offset: usize, len: usize) -> Result<(), StorageError> {
        if self.image.is_empty() {
            return Err(StorageError::NotInitialised);
        }
        match offset.checked_add(len) {
            Some(end) if end <= self.image.len() => Ok(()),
            _ => Err(StorageError::OutOfBounds),
        }
    }

    // ── Blob primitives ───────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn get_blob(&self, key: &'static str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.store.borrow().get(key).cloned())
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_blob(&self, key: &'static str, data: &[u8]) -> Result<(), StorageError> {
        self.store.borrow_mut().insert(key, data.to_vec());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn get_blob(&self, key: &'static str) -> Result<Option<Vec<u8>>, StorageError> {
        let key_buf = Self::c_name(key);
        let result = Self::with_nvs_handle(NAMESPACE, false, |handle| {
            let mut size: usize = 0;
            // First call: get size
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    core::ptr::null_mut(),
                    &mut size,
                )
            };
            if ret == ESP_ERR_NVS_NOT_FOUND {
                return Ok(None);
            }
            if ret != ESP_OK || size == 0 || size > MAX_BLOB_SIZE {
                return Err(ret);
            }

            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    buf.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(Some(buf))
        });
        match result {
            Ok(blob) => Ok(blob),
            // The namespace does not exist until the first write.
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
            Err(e) => {
                warn!("NvsAdapter: read of '{}' failed ({})", key, e);
                Err(StorageError::IoError)
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn set_blob(&self, key: &'static str, data: &[u8]) -> Result<(), StorageError> {
        let key_buf = Self::c_name(key);
        let result = Self::with_nvs_handle(NAMESPACE, true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    data.as_ptr() as *const _,
                    data.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        });
        result.map_err(|e| {
            warn!("NvsAdapter: write of '{}' failed ({})", key, e);
            StorageError::IoError
        })
    }

    /// NUL-terminated copy of an NVS name (max 15 characters).
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns_buf = Self::c_name(namespace);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

impl Default for NvsAdapter {
    fn default() -> Self {
        // Last-resort fallback when NVS init fails: nothing will persist.
        Self::new().unwrap_or_else(|_| Self::unbacked())
    }
}

// ── EEPROM emulation ──────────────────────────────────────────

impl EepromPort for NvsAdapter {
    fn begin(&mut self, size: usize) -> Result<(), StorageError> {
        if size == 0 || size > MAX_BLOB_SIZE {
            return Err(StorageError::OutOfBounds);
        }
        if self.image.len() == size {
            return Ok(());
        }
        // Erased EEPROM reads as zero, which never matches the sentinel.
        let mut image = vec![0u8; size];
        if let Some(blob) = self.get_blob(EEPROM_KEY)? {
            let len = blob.len().min(size);
            image[..len].copy_from_slice(&blob[..len]);
            info!("NvsAdapter: EEPROM image loaded ({} bytes)", blob.len());
        }
        self.image = image;
        Ok(())
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        self.check_range(offset, buf.len())?;
        buf.copy_from_slice(&self.image[offset..offset + buf.len()]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        self.check_range(offset, data.len())?;
        self.image[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        if self.image.is_empty() {
            return Err(StorageError::NotInitialised);
        }
        self.set_blob(EEPROM_KEY, &self.image)
    }
}

// ── Configuration ─────────────────────────────────────────────

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SensorConfig, ConfigError> {
        match self.get_blob(CONFIG_KEY) {
            Ok(Some(bytes)) => {
                let cfg: SensorConfig =
                    postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                cfg.validate().map_err(ConfigError::ValidationFailed)?;
                info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
                Ok(cfg)
            }
            Ok(None) => {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(SensorConfig::default())
            }
            Err(e) => {
                warn!("NvsAdapter: config read error ({}), using defaults", e);
                Ok(SensorConfig::default())
            }
        }
    }

    fn save(&self, config: &SensorConfig) -> Result<(), ConfigError> {
        config.validate().map_err(ConfigError::ValidationFailed)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        self.set_blob(CONFIG_KEY, &bytes)
            .map_err(|_| ConfigError::IoError)?;
        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}
