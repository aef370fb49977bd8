//! Gasmon firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod calibration;
pub mod config;
pub mod error;
pub mod fsm;
pub mod scheduler;
pub mod sensors;

// The adapters carry cfg-gated simulation backends so the crate builds
// and tests on the host.
pub mod adapters;

pub use error::{Error, Result};
