//! Application core: domain orchestration, zero direct I/O.
//!
//! This module contains the business rules for the gas monitor: the
//! lifecycle controller, console command parsing, and outbound events.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
