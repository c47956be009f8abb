//! Mock adapters for integration tests.
//!
//! Every port call is recorded so tests can assert on the full history
//! without a modem or panel attached.  [`Rig`] wires them to an
//! [`AppService`] and drives it with a simulated millisecond clock.

use std::collections::{HashMap, VecDeque};

use alarmlink::app::events::AppEvent;
use alarmlink::app::ports::{EventSink, InboxItem, MessagingPort, PanelPort, TimerPort};
use alarmlink::app::service::AppService;
use alarmlink::config::SystemConfig;
use alarmlink::error::{ActuatorError, InitError, TransportError};
use alarmlink::escalation::TickGate;
use alarmlink::monitor::{Line, RawSample};
use alarmlink::text::{Identity, MessageBody, bounded};

pub const PRIMARY: &str = "+5561900000001";
pub const SECOND: &str = "+5561900000002";
pub const THIRD: &str = "+5561900000003";
pub const STRANGER: &str = "+5511988887777";
pub const IMEI: &str = "867856032158612";

// ── MockPanel ─────────────────────────────────────────────────

pub struct MockPanel {
    pub armed: RawSample,
    pub siren: RawSample,
    pub pulses: Vec<u32>,
    pub fail_pulse: bool,
}

impl MockPanel {
    pub fn new() -> Self {
        Self {
            armed: RawSample::Digital(false),
            siren: RawSample::Digital(false),
            pulses: Vec::new(),
            fail_pulse: false,
        }
    }
}

impl PanelPort for MockPanel {
    fn read_line(&mut self, line: Line) -> RawSample {
        match line {
            Line::Armed => self.armed,
            Line::Siren => self.siren,
        }
    }

    fn pulse_arm_line(&mut self, duration_ms: u32) -> Result<(), ActuatorError> {
        if self.fail_pulse {
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.pulses.push(duration_ms);
        Ok(())
    }
}

// ── MockModem ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockModem {
    pub sent: Vec<(String, String)>,
    pub calls: Vec<String>,
    pub deleted: Vec<u16>,
    pub delete_attempts: u32,
    /// Deletes fail this many times before succeeding.
    pub delete_failures: u32,
    pub fail_send: bool,
    pub fail_read: bool,
    inbox: VecDeque<(InboxItem, String)>,
    bodies: HashMap<u16, String>,
    next_slot: u16,
}

#[allow(dead_code)]
impl MockModem {
    pub fn new() -> Self {
        Self { next_slot: 1, ..Default::default() }
    }

    /// Queue an inbound message; returns its slot.
    pub fn deliver(&mut self, sender: &str, body: &str) -> u16 {
        let slot = self.next_slot;
        self.next_slot += 1;
        self.inbox.push_back((InboxItem { sender: bounded(sender), slot }, body.to_string()));
        slot
    }

    pub fn texts_to(&self, destination: &str) -> Vec<&str> {
        self.sent
            .iter()
            .filter(|(to, _)| to == destination)
            .map(|(_, body)| body.as_str())
            .collect()
    }

    pub fn last_text(&self) -> Option<(&str, &str)> {
        self.sent.last().map(|(to, body)| (to.as_str(), body.as_str()))
    }
}

impl MessagingPort for MockModem {
    fn send_text(&mut self, destination: &str, body: &str) -> Result<(), TransportError> {
        if self.fail_send {
            return Err(TransportError::Timeout);
        }
        self.sent.push((destination.to_string(), body.to_string()));
        Ok(())
    }

    fn place_call(&mut self, destination: &str) -> Result<(), TransportError> {
        self.calls.push(destination.to_string());
        Ok(())
    }

    fn poll_inbox(&mut self) -> Option<InboxItem> {
        let (item, body) = self.inbox.pop_front()?;
        self.bodies.insert(item.slot, body);
        Some(item)
    }

    fn read_message(&mut self, slot: u16) -> Result<MessageBody, TransportError> {
        if self.fail_read {
            return Err(TransportError::Rejected);
        }
        self.bodies
            .get(&slot)
            .map(|b| bounded(b))
            .ok_or(TransportError::Malformed)
    }

    fn delete_message(&mut self, slot: u16) -> Result<(), TransportError> {
        self.delete_attempts += 1;
        if self.delete_failures > 0 {
            self.delete_failures -= 1;
            return Err(TransportError::Timeout);
        }
        self.bodies.remove(&slot);
        self.deleted.push(slot);
        Ok(())
    }

    fn device_id(&mut self) -> Identity {
        bounded(IMEI)
    }
}

// ── ManualTimer ───────────────────────────────────────────────

/// Timer fired by hand, gated exactly like the real one.
#[derive(Default)]
pub struct ManualTimer {
    gate: TickGate,
    epoch: u32,
    pub period_ms: Option<u32>,
    /// Start attempts, failed ones included.
    pub starts: u32,
    pub stops: u32,
    /// Starts fail this many times before succeeding.
    pub fail_starts: u32,
}

#[allow(dead_code)]
impl ManualTimer {
    /// Simulate the timer context firing once.
    pub fn fire(&self) -> bool {
        self.gate.fire(self.epoch)
    }

    /// Fire on behalf of a specific run, e.g. one already stopped.
    pub fn fire_with(&self, epoch: u32) -> bool {
        self.gate.fire(epoch)
    }

    /// Epoch handed out by the last `start_periodic`.
    pub fn gate_epoch(&self) -> u32 {
        self.epoch
    }
}

impl TimerPort for ManualTimer {
    fn start_periodic(&mut self, period_ms: u32) -> Result<(), InitError> {
        self.starts += 1;
        if self.fail_starts > 0 {
            self.fail_starts -= 1;
            self.gate.close();
            return Err(InitError::TimerStartFailed(-1));
        }
        self.epoch = self.gate.open();
        self.period_ms = Some(period_ms);
        Ok(())
    }

    fn stop(&mut self) {
        self.gate.close();
        self.stops += 1;
    }

    fn take_tick(&mut self) -> bool {
        self.gate.take()
    }

    fn is_running(&self) -> bool {
        self.gate.is_open()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, wanted: &AppEvent) -> usize {
        self.events.iter().filter(|e| *e == wanted).count()
    }

    pub fn saw(&self, wanted: &AppEvent) -> bool {
        self.count(wanted) > 0
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub struct Rig {
    pub app: AppService<ManualTimer>,
    pub panel: MockPanel,
    pub modem: MockModem,
    pub sink: RecordingSink,
    pub now: u32,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self::with_config(SystemConfig::default(), 0)
    }

    pub fn with_config(config: SystemConfig, start_ms: u32) -> Self {
        let mut rig = Self {
            app: AppService::new(config, ManualTimer::default()),
            panel: MockPanel::new(),
            modem: MockModem::new(),
            sink: RecordingSink::default(),
            now: start_ms,
        };
        rig.app.start(&mut rig.panel, IMEI, rig.now, &mut rig.sink);
        rig
    }

    /// Advance the clock by `ms` and run one polling iteration.
    pub fn step(&mut self, ms: u32) {
        self.now = self.now.wrapping_add(ms);
        self.app.poll(self.now, &mut self.panel, &mut self.modem, &mut self.sink);
    }

    /// One iteration long enough after the last change for a level to commit.
    pub fn settle(&mut self) {
        let debounce = self.app.config().debounce_interval_ms;
        self.step(debounce + 1);
    }

    /// Deliver `body` from `sender` and process it in one iteration.
    pub fn message(&mut self, sender: &str, body: &str) -> u16 {
        let slot = self.modem.deliver(sender, body);
        self.step(1);
        slot
    }

    pub fn set_siren(&mut self, active: bool) {
        self.panel.siren = RawSample::Digital(active);
    }

    pub fn set_armed(&mut self, active: bool) {
        self.panel.armed = RawSample::Digital(active);
    }

    pub fn fire_timer(&mut self) -> bool {
        self.app.timer().fire()
    }
}
