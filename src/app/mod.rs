//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules of the alarm bridge: command
//! grammar, reply texts, and the polling-context orchestration in
//! [`service`].  All interaction with the modem and the panel happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod replies;
pub mod service;
