//! Serial console adapter: non-blocking line input.
//!
//! Bytes are accumulated in a fixed 64-byte [`LineBuffer`] until CR or LF.
//! A line that overflows the buffer is discarded in full (up to its
//! terminator) instead of being executed truncated.
//!
//! - **`target_os = "espidf"`** puts the VFS stdin (UART0 / USB-CDC) into
//!   `O_NONBLOCK` mode and drains it from the control loop.
//! - **host** spawns a reader thread over `std::io::stdin` and hands bytes
//!   over a channel.

use log::warn;

/// Longest accepted command line, terminator excluded.
pub const LINE_CAPACITY: usize = 64;

/// Fixed-capacity line assembler.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: heapless::Vec<u8, LINE_CAPACITY>,
    overflowed: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte; returns a completed line on CR/LF.
    ///
    /// Empty lines (for example the LF of a CRLF pair) yield nothing.
    pub fn push(&mut self, byte: u8) -> Option<heapless::String<LINE_CAPACITY>> {
        if byte == b'\r' || byte == b'\n' {
            let overflowed = core::mem::take(&mut self.overflowed);
            let bytes = core::mem::take(&mut self.buf);
            if overflowed {
                warn!("Console: line longer than {} bytes discarded", LINE_CAPACITY);
                return None;
            }
            if bytes.is_empty() {
                return None;
            }
            return match heapless::String::from_utf8(bytes) {
                Ok(line) => Some(line),
                Err(_) => {
                    warn!("Console: non-UTF-8 input discarded");
                    None
                }
            };
        }
        if self.overflowed {
            return None;
        }
        if self.buf.push(byte).is_err() {
            self.overflowed = true;
            self.buf.clear();
        }
        None
    }
}

/// Non-blocking console reader.
pub struct Console {
    line: LineBuffer,
    #[cfg(not(target_os = "espidf"))]
    rx: std::sync::mpsc::Receiver<u8>,
}

impl Console {
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        use esp_idf_svc::sys::{F_GETFL, F_SETFL, O_NONBLOCK, fcntl};
        // SAFETY: fd 0 is the VFS console, opened by ESP-IDF before main.
        unsafe {
            let flags = fcntl(0, F_GETFL as i32);
            fcntl(0, F_SETFL as i32, flags | O_NONBLOCK as i32);
        }
        Self {
            line: LineBuffer::new(),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        use std::io::Read;
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            for byte in std::io::stdin().lock().bytes() {
                let Ok(byte) = byte else { break };
                if tx.send(byte).is_err() {
                    break;
                }
            }
        });
        Self {
            line: LineBuffer::new(),
            rx,
        }
    }

    /// Next complete line, if one is available without blocking.
    pub fn poll_line(&mut self) -> Option<heapless::String<LINE_CAPACITY>> {
        while let Some(byte) = self.next_byte() {
            if let Some(line) = self.line.push(byte) {
                return Some(line);
            }
        }
        None
    }

    #[cfg(target_os = "espidf")]
    fn next_byte(&mut self) -> Option<u8> {
        let mut byte = 0u8;
        // SAFETY: reads at most one byte into a valid local.
        let n = unsafe { esp_idf_svc::sys::read(0, (&raw mut byte).cast(), 1) };
        (n == 1).then_some(byte)
    }

    #[cfg(not(target_os = "espidf"))]
    fn next_byte(&mut self) -> Option<u8> {
        self.rx.try_recv().ok()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
