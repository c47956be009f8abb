//! Escalation scheduler against the recording modem and a hand-fired timer.

use alarmlink::app::ports::TimerPort;
use alarmlink::contacts::ContactList;
use alarmlink::error::InitError;
use alarmlink::escalation::{CallAttempt, EscalationScheduler};
use alarmlink::text::{Identity, bounded};

use crate::mock_hw::{ManualTimer, MockModem, PRIMARY, SECOND, THIRD};

fn contacts() -> ContactList {
    ContactList::new(&[bounded(PRIMARY), bounded(SECOND), bounded(THIRD)])
}

fn scheduler() -> EscalationScheduler<ManualTimer> {
    EscalationScheduler::new(ManualTimer::default(), 120_000)
}

fn assert_consistent(s: &EscalationScheduler<ManualTimer>) {
    assert_eq!(s.is_pending(), s.timer().is_running(), "pending must track the timer");
}

#[test]
fn rotation_wraps_after_last_slot() {
    let list = contacts();
    let mut modem = MockModem::new();
    let mut s = scheduler();

    let first = s.start(&list, &mut modem);
    assert_eq!(first, Some(CallAttempt { slot: 0, result: Ok(()) }));
    assert_consistent(&s);

    for expected in [1, 2, 0, 1] {
        assert!(s.timer().fire());
        let attempt = s.poll_tick(&list, &mut modem).unwrap();
        assert_eq!(attempt.slot, expected);
        assert_consistent(&s);
    }
    assert_eq!(modem.calls, [PRIMARY, SECOND, THIRD, PRIMARY, SECOND]);
    assert_eq!(s.rotation_index(), 2);
}

#[test]
fn start_while_pending_is_ignored() {
    let list = contacts();
    let mut modem = MockModem::new();
    let mut s = scheduler();

    s.start(&list, &mut modem);
    assert_eq!(s.start(&list, &mut modem), None);
    assert_eq!(modem.calls.len(), 1);
    assert_eq!(s.timer().starts, 1);
}

#[test]
fn no_tick_no_call() {
    let list = contacts();
    let mut modem = MockModem::new();
    let mut s = scheduler();

    s.start(&list, &mut modem);
    for _ in 0..5 {
        assert_eq!(s.poll_tick(&list, &mut modem), None);
    }
    assert_eq!(modem.calls.len(), 1);
}

#[test]
fn ticks_do_not_accumulate() {
    let list = contacts();
    let mut modem = MockModem::new();
    let mut s = scheduler();

    s.start(&list, &mut modem);
    s.timer().fire();
    s.timer().fire();
    s.timer().fire();
    assert!(s.poll_tick(&list, &mut modem).is_some());
    assert_eq!(s.poll_tick(&list, &mut modem), None);
}

#[test]
fn stop_resets_rotation_and_drops_fired_tick() {
    let list = contacts();
    let mut modem = MockModem::new();
    let mut s = scheduler();

    s.start(&list, &mut modem);
    s.timer().fire();
    s.poll_tick(&list, &mut modem);
    s.timer().fire();

    assert!(s.stop());
    assert_consistent(&s);
    assert_eq!(s.rotation_index(), 0);
    assert_eq!(s.poll_tick(&list, &mut modem), None);
    assert!(!s.stop(), "second stop is a no-op");
    assert_eq!(s.timer().stops, 1);
}

#[test]
fn restart_after_stop_begins_at_primary() {
    let list = contacts();
    let mut modem = MockModem::new();
    let mut s = scheduler();

    s.start(&list, &mut modem);
    s.timer().fire();
    s.poll_tick(&list, &mut modem);
    s.stop();
    s.start(&list, &mut modem);

    assert_eq!(modem.calls, [PRIMARY, SECOND, PRIMARY]);
    assert_eq!(s.timer().starts, 2);
}

#[test]
fn stale_epoch_from_previous_run_is_refused() {
    let list = contacts();
    let mut modem = MockModem::new();
    let mut s = scheduler();

    s.start(&list, &mut modem);
    let old = s.timer().gate_epoch();
    s.stop();
    s.start(&list, &mut modem);

    assert!(!s.timer().fire_with(old));
    assert_eq!(s.poll_tick(&list, &mut modem), None);
}

#[test]
fn all_blank_contacts_still_rotate() {
    let list = ContactList::new(&[Identity::new(), Identity::new(), Identity::new()]);
    let mut modem = MockModem::new();
    let mut s = scheduler();

    let first = s.start(&list, &mut modem).unwrap();
    assert!(first.result.is_err());
    s.timer().fire();
    assert_eq!(s.poll_tick(&list, &mut modem).unwrap().slot, 1);
    assert!(modem.calls.is_empty());
}

#[test]
fn failed_timer_start_leaves_nothing_armed() {
    let list = contacts();
    let mut modem = MockModem::new();
    let mut s = scheduler();
    s.timer_mut().fail_starts = 1;

    // The first call still goes out; the timer does not.
    let first = s.start(&list, &mut modem);
    assert_eq!(first, Some(CallAttempt { slot: 0, result: Ok(()) }));
    assert!(!s.is_pending());
    assert!(!s.timer().is_running());
    assert_eq!(s.timer_fault(), Some(InitError::TimerStartFailed(-1)));
    assert!(!s.timer().fire(), "closed gate accepts no ticks");
    assert_eq!(s.poll_tick(&list, &mut modem), None);

    // A stalled run is not restarted from the primary.
    assert_eq!(s.start(&list, &mut modem), None);
    assert_eq!(modem.calls, [PRIMARY]);

    assert_eq!(s.retry_timer(), Ok(()));
    assert_eq!(s.timer_fault(), None);
    assert_consistent(&s);
    assert!(s.timer().fire());
    assert_eq!(s.poll_tick(&list, &mut modem).unwrap().slot, 1);
    assert_eq!(modem.calls, [PRIMARY, SECOND]);
}

#[test]
fn retry_keeps_failing_until_the_timer_starts() {
    let list = contacts();
    let mut modem = MockModem::new();
    let mut s = scheduler();
    s.timer_mut().fail_starts = 3;

    s.start(&list, &mut modem);
    assert!(s.retry_timer().is_err());
    assert!(s.retry_timer().is_err());
    assert_eq!(s.retry_timer(), Ok(()));
    assert_eq!(s.timer().starts, 4);
    assert_consistent(&s);
    assert_eq!(s.retry_timer(), Ok(()), "nothing to retry once running");
    assert_eq!(s.timer().starts, 4);
}

#[test]
fn stop_clears_a_stalled_escalation() {
    let list = contacts();
    let mut modem = MockModem::new();
    let mut s = scheduler();
    s.timer_mut().fail_starts = 1;

    s.start(&list, &mut modem);
    assert!(s.stop());
    assert_eq!(s.timer_fault(), None);
    assert_eq!(s.rotation_index(), 0);
    assert_consistent(&s);

    s.start(&list, &mut modem);
    assert_eq!(modem.calls, [PRIMARY, PRIMARY]);
    assert_consistent(&s);
}
