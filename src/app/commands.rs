//! Inbound commands to the application service.
//!
//! The serial console delivers text lines; [`parse_line`] maps them onto
//! [`AppCommand`]s that the [`GasMonitor`](super::service::GasMonitor)
//! interprets.  Matching is case-insensitive after trimming whitespace.

use core::fmt::Write;

/// Longest unknown input echoed back in a diagnostic.
pub const MAX_ECHO_LEN: usize = 32;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Run a clean-air calibration and persist the new R0.
    Calibrate,
    /// Erase the stored calibration and mark the engine uncalibrated.
    Reset,
    /// Report lifecycle and calibration status.
    Info,
}

impl AppCommand {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Calibrate => "calibrate",
            Self::Reset => "reset",
            Self::Info => "info",
        }
    }
}

/// Non-empty input that matched no command (truncated for echoing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub heapless::String<MAX_ECHO_LEN>);

/// Parse one console line.  `None` for blank input.
pub fn parse_line(line: &str) -> Option<Result<AppCommand, UnknownCommand>> {
    let word = line.trim();
    if word.is_empty() {
        return None;
    }
    for cmd in [AppCommand::Calibrate, AppCommand::Reset, AppCommand::Info] {
        if word.eq_ignore_ascii_case(cmd.keyword()) {
            return Some(Ok(cmd));
        }
    }

    let mut echo = heapless::String::new();
    for c in word.chars() {
        if echo.write_char(c).is_err() {
            break;
        }
    }
    Some(Err(UnknownCommand(echo)))
}
