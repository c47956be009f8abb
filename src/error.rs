//! Unified error types for the AlarmLink firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! boot sequence's error handling uniform.  All variants are `Copy` so they
//! can be passed through events and log lines without allocation.
//!
//! Only [`InitError`] is allowed to abort startup.  Everything else is
//! handled where it is detected: transport failures are logged and dropped,
//! a failed message delete is retried until it succeeds.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The cellular transport rejected or failed an operation.
    Transport(TransportError),
    /// Peripheral or modem bring-up failed.
    Init(InitError),
    /// Configuration is invalid.
    Config(ConfigError),
    /// The arm line could not be driven.
    Actuator(ActuatorError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The modem did not answer within the command timeout.
    Timeout,
    /// The modem answered `ERROR` / `+CMS ERROR` / `+CME ERROR`.
    Rejected,
    /// The serial link failed while writing.
    WriteFailed,
    /// The response could not be parsed.
    Malformed,
    /// The destination identity is empty or not a phone number.
    InvalidDestination,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "modem timeout"),
            Self::Rejected => write!(f, "modem returned error"),
            Self::WriteFailed => write!(f, "serial write failed"),
            Self::Malformed => write!(f, "malformed modem response"),
            Self::InvalidDestination => write!(f, "invalid destination"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Initialisation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// The SIM800L never answered `AT` (DeviceInitializationFailure).
    ModemNotFound,
    /// The modem answered but refused a mandatory setup command.
    ModemSetupFailed(&'static str),
    GpioConfigFailed(i32),
    AdcInitFailed(i32),
    TimerCreateFailed(i32),
    /// The escalation timer exists but refused to start.  Not fatal at
    /// runtime: the scheduler retries while the siren stays active.
    TimerStartFailed(i32),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModemNotFound => write!(f, "GSM SIM800L not found"),
            Self::ModemSetupFailed(cmd) => write!(f, "modem refused {cmd}"),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={rc})"),
            Self::AdcInitFailed(rc) => write!(f, "ADC init failed (rc={rc})"),
            Self::TimerCreateFailed(rc) => write!(f, "escalation timer create failed (rc={rc})"),
            Self::TimerStartFailed(rc) => write!(f, "escalation timer start failed (rc={rc})"),
        }
    }
}

impl From<InitError> for Error {
    fn from(e: InitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The JSON override could not be parsed into a `SystemConfig`.
    Parse,
    /// A field failed validation.  The `&'static str` names the field.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "config parse failed"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
