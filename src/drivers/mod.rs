//! Actuator drivers, hardware initialisation, and peripheral helpers.

pub mod arm_line;
pub mod hw_init;
pub mod hw_timer;
pub mod system;
pub mod watchdog;
