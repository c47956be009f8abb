//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the debounced signals, the access list, the contact
//! rotation, the actuator and the escalation scheduler.  It runs entirely in
//! the polling context; all I/O flows through port traits injected at call
//! sites, making the whole service testable with mock adapters.
//!
//! ```text
//!  PanelPort ────▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                  │          AppService           │
//!  MessagingPort ◀▶│ Monitor · Commands · Escalate │
//!                  └──────────────────────────────┘
//!                                 ▲ take_tick
//!                             TimerPort
//! ```

use log::{debug, info, warn};

use crate::access::AccessList;
use crate::actuator::{AlarmActuator, ArmOutcome};
use crate::config::SystemConfig;
use crate::contacts::{ContactError, ContactList};
use crate::escalation::{CallAttempt, EscalationScheduler};
use crate::monitor::{Edge, Line, RawSample, Signal};
use crate::text::{Identity, MessageBody, bounded};

use super::commands::{self, ParseError, Verb};
use super::events::{AppEvent, TransportOp};
use super::ports::{EventSink, InboxItem, MessagingPort, PanelPort, TimerPort};
use super::replies;

/// Spacing of start attempts for an escalation timer that failed.
const TIMER_RETRY_MS: u32 = 1000;

// ───────────────────────────────────────────────────────────────
// Value types
// ───────────────────────────────────────────────────────────────

/// An outbound answer to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub destination: Identity,
    pub body: MessageBody,
}

impl Reply {
    fn to(destination: &str, body: MessageBody) -> Self {
        Self {
            destination: bounded(destination),
            body,
        }
    }
}

/// Point-in-time view of the alarm session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmSession {
    /// Debounced level of the armed indicator.
    pub armed: bool,
    pub escalation_pending: bool,
    pub rotation_index: usize,
    pub arming_grace_consumed: bool,
    /// The siren is being escalated but the timer would not start.
    pub escalation_stalled: bool,
}

/// Grace window opened by `ARMAR`.
#[derive(Debug, Clone, Copy, Default)]
struct ArmingGrace {
    opened_at_ms: Option<u32>,
    consumed: bool,
}

impl ArmingGrace {
    fn open(&mut self, now_ms: u32) {
        self.opened_at_ms = Some(now_ms);
        self.consumed = false;
    }

    /// Called for every siren trigger.  Closes the window either way;
    /// true when the trigger fell inside it.
    fn absorb(&mut self, now_ms: u32, window_ms: u32) -> bool {
        let Some(opened) = self.opened_at_ms.take() else {
            return false;
        };
        if now_ms.wrapping_sub(opened) > window_ms {
            return false;
        }
        self.consumed = true;
        true
    }

    /// Forget a window that has run out.  Must be called well within one
    /// counter period, or the wrapped clock reopens it.
    fn expire(&mut self, now_ms: u32, window_ms: u32) {
        if self
            .opened_at_ms
            .is_some_and(|opened| now_ms.wrapping_sub(opened) > window_ms)
        {
            self.opened_at_ms = None;
        }
    }
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService<T: TimerPort> {
    config: SystemConfig,
    acl: AccessList,
    contacts: ContactList,
    armed: Signal,
    siren: Signal,
    actuator: AlarmActuator,
    escalation: EscalationScheduler<T>,
    grace: ArmingGrace,
    /// When the stalled escalation timer was last tried.
    timer_attempt_ms: u32,
    device_id: Identity,
    restart_requested: bool,
}

impl<T: TimerPort> AppService<T> {
    /// Construct the service from configuration.
    ///
    /// Signals hold placeholder levels until [`start`](Self::start) seeds
    /// them from the panel.
    pub fn new(config: SystemConfig, timer: T) -> Self {
        let acl = AccessList::new(config.allowed_senders.iter().map(|n| n.as_str()));
        let contacts = ContactList::new(&config.contacts);
        let placeholder = Signal::new(
            RawSample::Digital(false),
            0,
            config.debounce_interval_ms,
            config.analog_threshold,
        );

        Self {
            acl,
            contacts,
            armed: placeholder,
            siren: placeholder,
            actuator: AlarmActuator::new(config.arm_pulse_ms),
            escalation: EscalationScheduler::new(timer, config.escalation_interval_ms),
            grace: ArmingGrace::default(),
            timer_attempt_ms: 0,
            device_id: Identity::new(),
            restart_requested: false,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Seed both signals with an initial sample and enter Idle.
    ///
    /// No edge is reported for the initial levels.
    pub fn start(
        &mut self,
        panel: &mut impl PanelPort,
        device_id: &str,
        now_ms: u32,
        sink: &mut impl EventSink,
    ) {
        let debounce = self.config.debounce_interval_ms;
        let threshold = self.config.analog_threshold;
        self.armed = Signal::new(panel.read_line(Line::Armed), now_ms, debounce, threshold);
        self.siren = Signal::new(panel.read_line(Line::Siren), now_ms, debounce, threshold);
        self.device_id = bounded(device_id);

        sink.emit(&AppEvent::Started {
            armed: self.armed.level(),
            siren: self.siren.level(),
        });
        info!(
            "AppService started: armed={} siren={} device={}",
            self.armed.level(),
            self.siren.level(),
            self.device_id
        );
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// One polling-loop iteration: at most one inbound message, then both
    /// lines, then at most one escalation tick.
    pub fn poll(
        &mut self,
        now_ms: u32,
        panel: &mut impl PanelPort,
        modem: &mut impl MessagingPort,
        sink: &mut impl EventSink,
    ) {
        // 1. Inbox
        if let Some(item) = modem.poll_inbox() {
            self.process_inbox(item, now_ms, panel, modem, sink);
        }

        // 2. Armed indicator
        if let Some(edge) = self.armed.sample(panel.read_line(Line::Armed), now_ms) {
            sink.emit(&AppEvent::LineChanged { line: Line::Armed, edge });
            let text = match edge {
                Edge::RoseActive => replies::ALARM_ARMED,
                Edge::FellInactive => replies::ALARM_DISARMED,
            };
            self.notify_primary(text, modem, sink);
        }

        // 3. Siren indicator
        self.grace.expire(now_ms, self.config.arming_grace_ms);
        if let Some(edge) = self.siren.sample(panel.read_line(Line::Siren), now_ms) {
            sink.emit(&AppEvent::LineChanged { line: Line::Siren, edge });
            match edge {
                Edge::RoseActive => self.on_siren_rose(now_ms, modem, sink),
                Edge::FellInactive => self.on_siren_fell(modem, sink),
            }
        }

        // 4. Escalation timer that failed to start
        if self.escalation.timer_fault().is_some()
            && now_ms.wrapping_sub(self.timer_attempt_ms) >= TIMER_RETRY_MS
        {
            self.timer_attempt_ms = now_ms;
            match self.escalation.retry_timer() {
                Ok(()) => info!("Escalation timer running again"),
                Err(e) => sink.emit(&AppEvent::EscalationTimerFailed(e)),
            }
        }

        // 5. Escalation tick handed over from the timer context
        if let Some(attempt) = self.escalation.poll_tick(&self.contacts, modem) {
            Self::report_call(attempt, sink);
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Authorize and dispatch one inbound message.
    ///
    /// Returns the reply to send, or `None` for verbs that answer nothing.
    pub fn handle_message(
        &mut self,
        text: &str,
        sender: &str,
        panel: &mut impl PanelPort,
        now_ms: u32,
        sink: &mut impl EventSink,
    ) -> Option<Reply> {
        if !self.acl.is_allowed(sender) {
            info!("Rejected message from unregistered sender {}", sender);
            sink.emit(&AppEvent::CommandRejected { sender: bounded(sender) });
            return Some(Reply::to(sender, replies::body(replies::REJECTED)));
        }

        let command = match commands::parse(text, sender) {
            Ok(c) => c,
            Err(ParseError::Empty | ParseError::Unknown) => {
                debug!("Unknown command from {}: {:?}", sender, text);
                sink.emit(&AppEvent::UnknownCommand);
                return Some(Reply::to(sender, replies::body(replies::UNKNOWN)));
            }
        };

        let verb = command.verb;
        info!("Command {} from {}", verb, sender);
        let body = match verb {
            Verb::Status => Some(AlarmActuator::write_status(&self.armed, &self.siren)),
            Verb::Arm => {
                self.set_arm(true, panel);
                self.grace.open(now_ms);
                None
            }
            Verb::Disarm => {
                self.set_arm(false, panel);
                None
            }
            Verb::Imei => Some(bounded(&self.device_id)),
            Verb::List => Some(self.contacts.render()),
            Verb::Register => {
                match command.registration() {
                    Some(reg) => match self.contacts.replace(reg.index, &reg.number) {
                        Ok(()) => info!("Contact {} set to {}", reg.index, reg.number),
                        Err(ContactError::IndexOutOfRange(i)) => {
                            warn!("REG index {} out of range", i)
                        }
                        Err(ContactError::InvalidNumber) => warn!("REG number rejected"),
                    },
                    None => warn!("REG argument malformed: {:?}", command.argument),
                }
                Some(self.contacts.render())
            }
            Verb::Help => Some(replies::body(replies::HELP)),
            Verb::Restart => {
                self.restart_requested = true;
                sink.emit(&AppEvent::RestartRequested);
                Some(replies::body(replies::RESTARTING))
            }
        };

        sink.emit(&AppEvent::CommandHandled(verb));
        body.map(|b| Reply::to(sender, b))
    }

    /// `true` once after `RESTART` was dispatched.
    pub fn take_restart_request(&mut self) -> bool {
        core::mem::take(&mut self.restart_requested)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn session(&self) -> AlarmSession {
        AlarmSession {
            armed: self.armed.level(),
            escalation_pending: self.escalation.is_pending(),
            rotation_index: self.escalation.rotation_index(),
            arming_grace_consumed: self.grace.consumed,
            escalation_stalled: self.escalation.timer_fault().is_some(),
        }
    }

    pub fn contacts(&self) -> &ContactList {
        &self.contacts
    }

    pub fn siren_active(&self) -> bool {
        self.siren.level()
    }

    pub fn timer(&self) -> &T {
        self.escalation.timer()
    }

    pub fn timer_mut(&mut self) -> &mut T {
        self.escalation.timer_mut()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn process_inbox(
        &mut self,
        item: InboxItem,
        now_ms: u32,
        panel: &mut impl PanelPort,
        modem: &mut impl MessagingPort,
        sink: &mut impl EventSink,
    ) {
        match modem.read_message(item.slot) {
            Ok(text) => {
                if let Some(reply) = self.handle_message(&text, &item.sender, panel, now_ms, sink) {
                    if let Err(error) = modem.send_text(&reply.destination, &reply.body) {
                        warn!("Reply to {} failed: {}", reply.destination, error);
                        sink.emit(&AppEvent::TransportFailure { op: TransportOp::SendText, error });
                    }
                }
            }
            Err(error) => {
                warn!("Reading slot {} failed: {}", item.slot, error);
                sink.emit(&AppEvent::TransportFailure { op: TransportOp::ReadMessage, error });
            }
        }

        // A slot left behind eventually fills the SIM and blocks delivery.
        let mut attempts: u32 = 0;
        while let Err(error) = modem.delete_message(item.slot) {
            attempts = attempts.saturating_add(1);
            if attempts == 1 {
                sink.emit(&AppEvent::TransportFailure { op: TransportOp::DeleteMessage, error });
            }
            warn!("Deleting slot {} failed ({}), attempt {}", item.slot, error, attempts);
        }
    }

    fn set_arm(&mut self, desired: bool, panel: &mut impl PanelPort) {
        if let ArmOutcome::Failed(e) = self.actuator.set_arm(desired, &self.armed, panel) {
            warn!("Arm line request not applied: {}", e);
        }
    }

    fn on_siren_rose(&mut self, now_ms: u32, modem: &mut impl MessagingPort, sink: &mut impl EventSink) {
        if self.grace.absorb(now_ms, self.config.arming_grace_ms) {
            info!("Siren trigger inside arming grace, not escalating");
            sink.emit(&AppEvent::ArmingGraceApplied);
            return;
        }

        if let Some(attempt) = self.escalation.start(&self.contacts, modem) {
            sink.emit(&AppEvent::EscalationStarted);
            Self::report_call(attempt, sink);
            if let Some(e) = self.escalation.timer_fault() {
                self.timer_attempt_ms = now_ms;
                sink.emit(&AppEvent::EscalationTimerFailed(e));
            }
        }
    }

    fn on_siren_fell(&mut self, modem: &mut impl MessagingPort, sink: &mut impl EventSink) {
        if self.escalation.stop() {
            sink.emit(&AppEvent::EscalationStopped);
        }
        self.notify_primary(replies::SIREN_OFF, modem, sink);
    }

    fn notify_primary(&self, text: &'static str, modem: &mut impl MessagingPort, sink: &mut impl EventSink) {
        let Some(primary) = self.contacts.primary() else {
            warn!("No primary contact, dropping notification {:?}", text);
            return;
        };
        match modem.send_text(primary, text) {
            Ok(()) => sink.emit(&AppEvent::Notified(text)),
            Err(error) => {
                warn!("Notification to {} failed: {}", primary, error);
                sink.emit(&AppEvent::TransportFailure { op: TransportOp::SendText, error });
            }
        }
    }

    fn report_call(attempt: CallAttempt, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::EscalationCall {
            slot: attempt.slot,
            ok: attempt.result.is_ok(),
        });
        if let Err(error) = attempt.result {
            sink.emit(&AppEvent::TransportFailure { op: TransportOp::PlaceCall, error });
        }
    }
}
