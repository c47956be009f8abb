//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements     | Connects to                 |
//! |------------|----------------|-----------------------------|
//! | `modem`    | MessagingPort  | SIM800L over UART (AT, text)|
//! | `panel`    | PanelPort      | ESP32 GPIO/ADC, arm line    |
//! | `log_sink` | EventSink      | Serial log output           |
//! | `time`     |:              | ESP32 system timer          |
//!
//! The escalation timer (`TimerPort`) lives in
//! [`drivers::hw_timer`](crate::drivers::hw_timer).

pub mod log_sink;
pub mod modem;
pub mod panel;
pub mod time;
