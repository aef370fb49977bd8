//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements            | Connects to               |
//! |------------|-----------------------|---------------------------|
//! | `analog`   | AnalogPort            | ESP32 ADC1 (oneshot)      |
//! | `console`  | (line source)         | UART0 / USB-CDC stdin     |
//! | `hardware` | AnalogPort, ClockPort | ADC + time, combined      |
//! |            | DelayNs               |                           |
//! | `log_sink` | EventSink             | Serial log output         |
//! | `nvs`      | EepromPort            | NVS / in-memory store     |
//! |            | ConfigPort            |                           |
//! | `time`     | ClockPort, DelayNs    | ESP32 system timer        |

pub mod analog;
pub mod console;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
