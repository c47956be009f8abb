//! System configuration parameters
//!
//! All tunable parameters for the AlarmLink bridge.  Values are compiled in;
//! a JSON override can be embedded at build time through the
//! `ALARMLINK_CONFIG` environment variable.  Nothing is persisted at runtime.

use serde::{Deserialize, Serialize};

use crate::access::MAX_ALLOWED;
use crate::contacts::NUM_CONTACTS;
use crate::error::ConfigError;
use crate::text::{Identity, bounded, is_phone_number};

/// How the armed indicator line is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMode {
    /// `gpio_get_level`, non-zero = active.
    Digital,
    /// ADC reading compared against `analog_threshold`.
    Analog,
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Identities ---
    /// Phone numbers allowed to send commands.
    pub allowed_senders: heapless::Vec<Identity, MAX_ALLOWED>,
    /// Initial contact rotation.  Slot 0 is the primary contact.
    pub contacts: [Identity; NUM_CONTACTS],

    // --- Panel inputs ---
    /// Minimum time between two confirmed level changes (milliseconds)
    pub debounce_interval_ms: u32,
    /// ADC counts at or above which an analog line reads active
    pub analog_threshold: u16,
    /// Sampling mode of the armed indicator
    pub armed_input: InputMode,

    // --- Actuator ---
    /// Width of the active-low arm/disarm pulse (milliseconds)
    pub arm_pulse_ms: u32,
    /// Window after ARMAR in which the first siren trigger is ignored (milliseconds)
    pub arming_grace_ms: u32,

    // --- Escalation ---
    /// Interval between escalation calls (milliseconds)
    pub escalation_interval_ms: u32,

    // --- Modem ---
    /// SIM800L UART baud rate
    pub modem_baud: u32,
    /// Power-up settle time before the first AT command (milliseconds)
    pub modem_boot_ms: u32,

    // --- Timing ---
    /// Polling loop period (milliseconds)
    pub loop_interval_ms: u32,
    /// Task watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut allowed_senders = heapless::Vec::new();
        for n in ["+5561900000001", "+5561900000002", "+5561900000003"] {
            let _ = allowed_senders.push(bounded(n));
        }

        Self {
            allowed_senders,
            contacts: [
                bounded("+5561900000001"),
                bounded("+5561900000002"),
                bounded("+5561900000003"),
            ],

            // Panel inputs
            debounce_interval_ms: 1000,
            analog_threshold: 2460,
            armed_input: InputMode::Digital,

            // Actuator
            arm_pulse_ms: 1000,
            arming_grace_ms: 5000,

            // Escalation
            escalation_interval_ms: 120_000, // 2 min

            // Modem
            modem_baud: 9600,
            modem_boot_ms: 10_000,

            // Timing
            loop_interval_ms: 20,
            watchdog_timeout_ms: 90_000,
        }
    }
}

impl SystemConfig {
    /// Parse a full configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|_| ConfigError::Parse)
    }

    /// Range and consistency checks.  Rejects rather than clamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_senders.is_empty() {
            return Err(ConfigError::ValidationFailed("allowed_senders is empty"));
        }
        if !self.allowed_senders.iter().all(|n| is_phone_number(n)) {
            return Err(ConfigError::ValidationFailed("allowed_senders has a malformed number"));
        }
        if self.contacts[0].is_empty() {
            return Err(ConfigError::ValidationFailed("contacts[0] (primary) is empty"));
        }
        if !self.contacts.iter().all(|n| n.is_empty() || is_phone_number(n)) {
            return Err(ConfigError::ValidationFailed("contacts has a malformed number"));
        }
        if self.debounce_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("debounce_interval_ms is 0"));
        }
        if self.escalation_interval_ms <= self.debounce_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "escalation_interval_ms must exceed debounce_interval_ms",
            ));
        }
        if self.arm_pulse_ms == 0 {
            return Err(ConfigError::ValidationFailed("arm_pulse_ms is 0"));
        }
        if self.loop_interval_ms == 0 || self.loop_interval_ms >= self.debounce_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "loop_interval_ms must be non-zero and below debounce_interval_ms",
            ));
        }
        if self.watchdog_timeout_ms <= self.arm_pulse_ms {
            return Err(ConfigError::ValidationFailed(
                "watchdog_timeout_ms must exceed arm_pulse_ms",
            ));
        }
        Ok(())
    }
}
