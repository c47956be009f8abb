//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink {
    emitted: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events logged since startup.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted = self.emitted.wrapping_add(1);
        match event {
            AppEvent::Started { armed, siren } => {
                info!("START | armed={} siren={}", u8::from(*armed), u8::from(*siren));
            }
            AppEvent::LineChanged { line, edge } => {
                info!("LINE | {:?} {:?}", line, edge);
            }
            AppEvent::Notified(text) => {
                info!("NOTIFY | primary <- {:?}", text);
            }
            AppEvent::CommandRejected { sender } => {
                info!("ACL | rejected sender={}", sender);
            }
            AppEvent::CommandHandled(verb) => {
                info!("CMD | {}", verb);
            }
            AppEvent::UnknownCommand => {
                info!("CMD | unknown");
            }
            AppEvent::ArmingGraceApplied => {
                info!("ESC | siren trigger absorbed by arming grace");
            }
            AppEvent::EscalationStarted => {
                info!("ESC | started");
            }
            AppEvent::EscalationCall { slot, ok } => {
                info!("ESC | call slot={} accepted={}", slot, ok);
            }
            AppEvent::EscalationStopped => {
                info!("ESC | stopped");
            }
            AppEvent::EscalationTimerFailed(e) => {
                warn!("ESC | timer not running: {}", e);
            }
            AppEvent::TransportFailure { op, error } => {
                warn!("MODEM | {:?} failed: {}", op, error);
            }
            AppEvent::RestartRequested => {
                info!("SYS | restart requested");
            }
        }
    }
}
