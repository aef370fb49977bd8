//! Fuzz target: console line assembly and command parsing
//!
//! Drives arbitrary byte streams through `LineBuffer` and every completed
//! line through `parse_line`, asserting that lines never exceed the buffer
//! and unknown input is always echoed truncated.
//!
//! cargo fuzz run fuzz_console_input

#![no_main]

use gasmon::adapters::console::{LINE_CAPACITY, LineBuffer};
use gasmon::app::commands::{MAX_ECHO_LEN, parse_line};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut buf = LineBuffer::new();
    for &byte in data {
        let Some(line) = buf.push(byte) else { continue };
        assert!(line.len() <= LINE_CAPACITY);
        assert!(!line.contains(['\r', '\n']));
        if let Some(Err(unknown)) = parse_line(&line) {
            assert!(unknown.0.len() <= MAX_ECHO_LEN);
            assert!(!unknown.0.is_empty());
        }
    }
});
