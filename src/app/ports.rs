//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (modem, panel I/O, escalation timer, event sinks)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.

use crate::error::{ActuatorError, InitError, TransportError};
use crate::monitor::{Line, RawSample};
use crate::text::{Identity, MessageBody};

// ───────────────────────────────────────────────────────────────
// Messaging port (cellular transport)
// ───────────────────────────────────────────────────────────────

/// A message waiting in the modem's inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxItem {
    /// Caller ID of the sender, truncated to [`IDENTITY_LEN`](crate::text::IDENTITY_LEN).
    pub sender: Identity,
    /// Storage slot on the SIM.
    pub slot: u16,
}

/// Text and voice primitives offered by the cellular modem.
///
/// Every call may block on the serial link; none is ever invoked from the
/// escalation timer context.
pub trait MessagingPort {
    /// Send an SMS.  `body` is at most [`MESSAGE_LEN`](crate::text::MESSAGE_LEN) bytes.
    fn send_text(&mut self, destination: &str, body: &str) -> Result<(), TransportError>;

    /// Dial `destination` (voice).  Returns once the modem accepted the dial.
    fn place_call(&mut self, destination: &str) -> Result<(), TransportError>;

    /// Non-blocking: at most one pending inbound message per call.
    fn poll_inbox(&mut self) -> Option<InboxItem>;

    /// Message body in `slot`, truncated to [`MESSAGE_LEN`](crate::text::MESSAGE_LEN).
    fn read_message(&mut self, slot: u16) -> Result<MessageBody, TransportError>;

    /// Free `slot`.  Callers retry until this succeeds.
    fn delete_message(&mut self, slot: u16) -> Result<(), TransportError>;

    /// Modem identity (IMEI).
    fn device_id(&mut self) -> Identity;
}

// ───────────────────────────────────────────────────────────────
// Panel port (alarm panel wiring)
// ───────────────────────────────────────────────────────────────

/// Raw access to the panel: two indicator inputs and the arm/disarm line.
pub trait PanelPort {
    /// Sample one indicator line.
    fn read_line(&mut self, line: Line) -> RawSample;

    /// Drive the arm line active for `duration_ms`, then release it.
    /// Blocks for the pulse duration.
    fn pulse_arm_line(&mut self, duration_ms: u32) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Timer port (escalation timer)
// ───────────────────────────────────────────────────────────────

/// Periodic timer that runs in its own context and hands ticks to the
/// polling loop.
///
/// Only the polling context calls these methods.
pub trait TimerPort {
    /// Enable the timer.  Ticks fired by any earlier run are discarded.
    ///
    /// On `Err` the timer is left stopped: `is_running()` is `false`.
    fn start_periodic(&mut self, period_ms: u32) -> Result<(), InitError>;

    /// Disable the timer.  After this returns, [`take_tick`](Self::take_tick)
    /// reports `false` until the next `start_periodic`, even for a tick that
    /// had already fired.
    fn stop(&mut self);

    /// Consume the pending tick of the current run, if any.
    fn take_tick(&mut self) -> bool;

    fn is_running(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
