//! Alarm actuator: toggles the panel's armed state and renders status text.
//!
//! The panel has a single "toggle" input: one active-low pulse flips it
//! between armed and disarmed.  [`AlarmActuator::set_arm`] therefore checks
//! the debounced armed indicator first and only pulses when the panel is not
//! already in the requested state.  It never waits for the panel to react;
//! the next monitor cycles observe and debounce the result.

use core::fmt::Write;

use log::{info, warn};

use crate::app::ports::PanelPort;
use crate::error::ActuatorError;
use crate::monitor::Signal;
use crate::text::{MessageBody, Truncating};

/// Result of a [`AlarmActuator::set_arm`] request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOutcome {
    /// Panel already in the requested state; no pulse issued.
    AlreadyInState,
    /// Toggle pulse issued.
    Pulsed,
    /// The arm line could not be driven.
    Failed(ActuatorError),
}

pub struct AlarmActuator {
    pulse_ms: u32,
    pulses: u32,
}

impl AlarmActuator {
    pub fn new(pulse_ms: u32) -> Self {
        Self { pulse_ms, pulses: 0 }
    }

    /// Bring the panel to `desired` (true = armed).  Idempotent.
    pub fn set_arm(&mut self, desired: bool, armed: &Signal, panel: &mut impl PanelPort) -> ArmOutcome {
        if armed.level() == desired {
            info!("Actuator: panel already {}", if desired { "armed" } else { "disarmed" });
            return ArmOutcome::AlreadyInState;
        }

        match panel.pulse_arm_line(self.pulse_ms) {
            Ok(()) => {
                self.pulses = self.pulses.wrapping_add(1);
                info!(
                    "Actuator: {}ms pulse issued to {}",
                    self.pulse_ms,
                    if desired { "arm" } else { "disarm" }
                );
                ArmOutcome::Pulsed
            }
            Err(e) => {
                warn!("Actuator: pulse failed: {}", e);
                ArmOutcome::Failed(e)
            }
        }
    }

    /// Total pulses issued since startup.
    pub fn pulse_count(&self) -> u32 {
        self.pulses
    }

    /// Two-line status text from the debounced levels.
    pub fn write_status(armed: &Signal, siren: &Signal) -> MessageBody {
        let mut body = MessageBody::new();
        let _ = write!(
            Truncating(&mut body),
            "Status atual:\r\nArmado: {}\r\nDisparo: {}",
            u8::from(armed.level()),
            u8::from(siren.level()),
        );
        body
    }
}
