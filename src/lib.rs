//! AlarmLink firmware library.
//!
//! Bridges an alarm panel to SMS and voice calls through a SIM800L modem.
//! Exposes the pure-logic modules for integration testing and the
//! adapters/drivers used by the ESP-IDF binary. All ESP-IDF-specific code
//! is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod access;
pub mod actuator;
pub mod app;
pub mod config;
pub mod contacts;
pub mod error;
pub mod escalation;
pub mod monitor;
pub mod pins;
pub mod text;

pub mod adapters;
pub mod drivers;
