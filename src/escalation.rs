//! Escalation scheduler: calls down the contact rotation until the siren
//! stops.
//!
//! ```text
//!            siren RoseActive (outside arming grace)
//!   ┌──────┐ ─────────────────────────────────────────▶ ┌────────────┐
//!   │ Idle │    call contact[i], i += 1, timer on       │ Escalating │◀─┐
//!   └──────┘ ◀───────────────────────────────────────── └────────────┘  │ timer tick:
//!            siren FellInactive                                │       │ call contact[i],
//!            timer off, i = 0, "Sirene desligada"              └───────┘ i += 1 (mod N)
//! ```
//!
//! ## Execution contexts
//!
//! The periodic timer fires in its own context (esp_timer task on target,
//! a worker thread on host).  It does nothing but record the tick in a
//! [`TickGate`].  The polling loop consumes the tick and places the call,
//! so the modem is only ever driven from one context.
//!
//! Stopping the timer closes the gate before anything else is reset.  A
//! tick that fired but was not yet consumed is thereby discarded, and a
//! late tick from an old run can never be taken by a newer one.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use log::{error, info, warn};

use crate::app::ports::{MessagingPort, TimerPort};
use crate::contacts::ContactList;
use crate::error::{InitError, TransportError};

// ═══════════════════════════════════════════════════════════════
//  Tick gate (timer context → polling context)
// ═══════════════════════════════════════════════════════════════

/// Lock-free handoff of timer ticks, guarded by an enable gate.
///
/// Each `open()` starts a new run identified by a non-zero epoch.  The
/// timer context calls [`fire`](Self::fire) with the epoch of the run it
/// belongs to; the polling context calls [`take`](Self::take).
#[derive(Debug)]
pub struct TickGate {
    epoch: AtomicU32,
    enabled: AtomicBool,
    /// Epoch of the run whose tick is waiting; 0 = none.
    fired: AtomicU32,
}

impl TickGate {
    pub const fn new() -> Self {
        Self {
            epoch: AtomicU32::new(0),
            enabled: AtomicBool::new(false),
            fired: AtomicU32::new(0),
        }
    }

    /// Begin a new run.  Returns its epoch.
    pub fn open(&self) -> u32 {
        self.enabled.store(false, Ordering::SeqCst);
        let mut epoch = self.epoch.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        if epoch == 0 {
            epoch = self.epoch.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        }
        self.fired.store(0, Ordering::SeqCst);
        self.enabled.store(true, Ordering::SeqCst);
        epoch
    }

    /// End the current run and drop any tick it left behind.
    pub fn close(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.fired.store(0, Ordering::SeqCst);
    }

    /// Timer context: record a tick for run `epoch`.
    ///
    /// Never blocks.  Returns `false` once that run is over, which tells a
    /// worker thread to exit.
    pub fn fire(&self, epoch: u32) -> bool {
        if !self.enabled.load(Ordering::Acquire) || self.epoch.load(Ordering::Acquire) != epoch {
            return false;
        }
        self.fired.store(epoch, Ordering::Release);
        true
    }

    /// Epoch of the run in progress (meaningful only while open).
    pub fn current_epoch(&self) -> u32 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Polling context: consume the pending tick of the current run.
    pub fn take(&self) -> bool {
        let fired = self.fired.swap(0, Ordering::AcqRel);
        fired != 0
            && self.enabled.load(Ordering::Acquire)
            && fired == self.epoch.load(Ordering::Acquire)
    }

    pub fn is_open(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

impl Default for TickGate {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

/// One escalation call and how the modem took it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallAttempt {
    pub slot: usize,
    pub result: Result<(), TransportError>,
}

/// Escalation state owned by the polling context.
///
/// `pending` and the timer's enabled state always change together, so
/// `is_pending() == timer.is_running()` holds between calls.  When the timer
/// refuses to start the escalation is *stalled* instead: not pending, the
/// fault kept for [`retry_timer`](Self::retry_timer) until the siren stops.
pub struct EscalationScheduler<T: TimerPort> {
    timer: T,
    interval_ms: u32,
    pending: bool,
    stalled: Option<InitError>,
    rotation: usize,
}

impl<T: TimerPort> EscalationScheduler<T> {
    pub fn new(timer: T, interval_ms: u32) -> Self {
        Self {
            timer,
            interval_ms,
            pending: false,
            stalled: None,
            rotation: 0,
        }
    }

    /// Enter Escalating: call the next contact now and arm the timer.
    ///
    /// Returns `None` if an escalation is already running or stalled.  The
    /// first call goes out even if the timer then fails to start; check
    /// [`timer_fault`](Self::timer_fault).
    pub fn start(&mut self, contacts: &ContactList, modem: &mut impl MessagingPort) -> Option<CallAttempt> {
        if self.pending || self.stalled.is_some() {
            return None;
        }
        info!("Escalation: starting at slot {}", self.rotation);
        let attempt = self.call_next(contacts, modem);
        // A failure here is recorded in `stalled`; the caller reads it back.
        let _ = self.arm_timer();
        Some(attempt)
    }

    /// Try again to start the timer of a stalled escalation.
    ///
    /// `Ok` if the escalation is (now) running or there is nothing to retry.
    pub fn retry_timer(&mut self) -> Result<(), InitError> {
        if self.stalled.is_none() {
            return Ok(());
        }
        self.arm_timer()
    }

    /// Consume a timer tick, if one fired, and call the next contact.
    pub fn poll_tick(&mut self, contacts: &ContactList, modem: &mut impl MessagingPort) -> Option<CallAttempt> {
        if !self.timer.take_tick() {
            return None;
        }
        debug_assert!(self.pending, "tick delivered while idle");
        Some(self.call_next(contacts, modem))
    }

    /// Return to Idle.  Returns `false` if no escalation was running or
    /// stalled.
    pub fn stop(&mut self) -> bool {
        if !self.pending && self.stalled.is_none() {
            return false;
        }
        // Disable first: only then is the index safe to reset.
        self.timer.stop();
        self.pending = false;
        self.stalled = None;
        self.rotation = 0;
        info!("Escalation: stopped");
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Why the timer of the current escalation is not running, if it failed.
    pub fn timer_fault(&self) -> Option<InitError> {
        self.stalled
    }

    /// Slot that will be called next.
    pub fn rotation_index(&self) -> usize {
        self.rotation
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    fn arm_timer(&mut self) -> Result<(), InitError> {
        match self.timer.start_periodic(self.interval_ms) {
            Ok(()) => {
                self.pending = true;
                self.stalled = None;
                Ok(())
            }
            Err(e) => {
                error!("Escalation: timer did not start ({}), calls stalled", e);
                self.pending = false;
                self.stalled = Some(e);
                Err(e)
            }
        }
    }

    fn call_next(&mut self, contacts: &ContactList, modem: &mut impl MessagingPort) -> CallAttempt {
        let slot = self.rotation;
        let result = match contacts.get(slot) {
            Some(number) => modem.place_call(number),
            None => Err(TransportError::InvalidDestination),
        };
        match result {
            Ok(()) => info!("Escalation: calling slot {}", slot),
            Err(e) => warn!("Escalation: call to slot {} failed: {}", slot, e),
        }
        self.rotation = (slot + 1) % contacts.len();
        CallAttempt { slot, result }
    }
}
