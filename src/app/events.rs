//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them; on target they are logged.

use crate::error::{InitError, TransportError};
use crate::monitor::{Edge, Line};
use crate::text::Identity;

use super::commands::Verb;

/// Which transport primitive failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportOp {
    SendText,
    PlaceCall,
    ReadMessage,
    DeleteMessage,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service has seeded its signals (carries the initial levels).
    Started { armed: bool, siren: bool },

    /// A debounced line changed level.
    LineChanged { line: Line, edge: Edge },

    /// A notification went out to the primary contact.
    Notified(&'static str),

    /// A sender outside the access list was answered with the rejection text.
    CommandRejected { sender: Identity },

    /// An authorized command was dispatched.
    CommandHandled(Verb),

    /// An authorized sender sent something unparseable.
    UnknownCommand,

    /// A siren trigger right after `ARMAR` was treated as settling noise.
    ArmingGraceApplied,

    EscalationStarted,

    /// One escalation call; `ok` is the modem's acceptance of the dial.
    EscalationCall { slot: usize, ok: bool },

    EscalationStopped,

    /// The escalation timer refused to start; retried while the siren holds.
    EscalationTimerFailed(InitError),

    TransportFailure { op: TransportOp, error: TransportError },

    /// `RESTART` was accepted; the main loop resets the device.
    RestartRequested,
}
