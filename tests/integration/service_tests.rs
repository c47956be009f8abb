//! End-to-end tests for the AppService polling pipeline.
//!
//! Inbound message → ACL → command → actuator / reply, and panel edges →
//! notifications / escalation, all against recording mocks.

use alarmlink::app::commands::Verb;
use alarmlink::app::events::{AppEvent, TransportOp};
use alarmlink::app::ports::TimerPort;
use alarmlink::app::replies;
use alarmlink::config::SystemConfig;
use alarmlink::error::{InitError, TransportError};
use alarmlink::text::Identity;

use crate::mock_hw::{IMEI, PRIMARY, Rig, SECOND, STRANGER, THIRD};

// ── Access control ────────────────────────────────────────────

#[test]
fn unregistered_sender_gets_rejection_and_nothing_else() {
    let mut rig = Rig::new();
    rig.set_armed(true);
    rig.settle();
    let sent_before = rig.modem.sent.len();

    let slot = rig.message(STRANGER, "DESARMAR");

    assert!(rig.panel.pulses.is_empty(), "no actuation for strangers");
    assert_eq!(rig.modem.sent.len(), sent_before + 1);
    assert_eq!(rig.modem.last_text(), Some((STRANGER, replies::REJECTED)));
    assert_eq!(rig.modem.deleted, [slot]);
    assert!(rig.sink.saw(&AppEvent::CommandRejected { sender: alarmlink::text::bounded(STRANGER) }));
}

#[test]
fn rejection_is_returned_directly_by_handle_message() {
    let mut rig = Rig::new();
    let reply = rig
        .app
        .handle_message("STATUS", STRANGER, &mut rig.panel, 0, &mut rig.sink)
        .unwrap();
    assert_eq!(reply.destination.as_str(), STRANGER);
    assert_eq!(reply.body.as_str(), replies::REJECTED);
}

// ── Informational verbs ───────────────────────────────────────

#[test]
fn lowercase_status_reports_debounced_levels() {
    let mut rig = Rig::new();
    rig.set_armed(true);
    rig.settle();

    rig.message(PRIMARY, "  status \r\n");

    assert_eq!(
        rig.modem.last_text(),
        Some((PRIMARY, "Status atual:\r\nArmado: 1\r\nDisparo: 0"))
    );
    assert!(rig.sink.saw(&AppEvent::CommandHandled(Verb::Status)));
}

#[test]
fn status_ignores_undebounced_raw_level() {
    let mut rig = Rig::new();
    rig.set_siren(true); // not yet committed
    rig.message(SECOND, "STATUS");
    assert_eq!(
        rig.modem.last_text(),
        Some((SECOND, "Status atual:\r\nArmado: 0\r\nDisparo: 0"))
    );
}

#[test]
fn imei_listar_and_ajuda() {
    let mut rig = Rig::new();

    rig.message(PRIMARY, "IMEI");
    assert_eq!(rig.modem.last_text(), Some((PRIMARY, IMEI)));

    rig.message(PRIMARY, "listar");
    let expected = format!("0: {PRIMARY}\r\n1: {SECOND}\r\n2: {THIRD}");
    assert_eq!(rig.modem.last_text(), Some((PRIMARY, expected.as_str())));

    rig.message(PRIMARY, "Ajuda");
    assert_eq!(rig.modem.last_text(), Some((PRIMARY, replies::HELP)));
}

#[test]
fn unknown_and_empty_bodies_point_to_help() {
    let mut rig = Rig::new();
    rig.message(THIRD, "ARMAR AGORA");
    assert_eq!(rig.modem.last_text(), Some((THIRD, replies::UNKNOWN)));
    rig.message(THIRD, "   ");
    assert_eq!(rig.modem.last_text(), Some((THIRD, replies::UNKNOWN)));
    assert_eq!(rig.sink.count(&AppEvent::UnknownCommand), 2);
    assert!(rig.panel.pulses.is_empty());
}

// ── Arm / disarm ──────────────────────────────────────────────

#[test]
fn armar_pulses_once_and_sends_no_reply() {
    let mut rig = Rig::new();
    rig.message(PRIMARY, "ARMAR");
    assert_eq!(rig.panel.pulses, [1000]);
    assert!(rig.modem.sent.is_empty());
}

#[test]
fn armar_is_idempotent_when_already_armed() {
    let mut rig = Rig::new();
    rig.set_armed(true);
    rig.settle();
    let sent_before = rig.modem.sent.len();

    rig.message(PRIMARY, "ARMAR");

    assert!(rig.panel.pulses.is_empty());
    assert_eq!(rig.modem.sent.len(), sent_before);
}

#[test]
fn desarmar_pulses_only_when_armed() {
    let mut rig = Rig::new();
    rig.message(PRIMARY, "DESARMAR");
    assert!(rig.panel.pulses.is_empty());

    rig.set_armed(true);
    rig.settle();
    rig.message(PRIMARY, "DESARMAR");
    assert_eq!(rig.panel.pulses, [1000]);
}

#[test]
fn failed_pulse_is_not_fatal() {
    let mut rig = Rig::new();
    rig.panel.fail_pulse = true;
    let slot = rig.message(PRIMARY, "ARMAR");
    assert!(rig.panel.pulses.is_empty());
    assert_eq!(rig.modem.deleted, [slot]);
    assert!(rig.sink.saw(&AppEvent::CommandHandled(Verb::Arm)));
}

#[test]
fn armed_indicator_edges_notify_primary() {
    let mut rig = Rig::new();
    rig.set_armed(true);
    rig.settle();
    rig.set_armed(false);
    rig.settle();
    assert_eq!(
        rig.modem.texts_to(PRIMARY),
        [replies::ALARM_ARMED, replies::ALARM_DISARMED]
    );
}

// ── REG ───────────────────────────────────────────────────────

#[test]
fn reg_replaces_slot_and_echoes_list() {
    let mut rig = Rig::new();
    rig.message(PRIMARY, "reg 1 +5561977776666");

    let expected = format!("0: {PRIMARY}\r\n1: +5561977776666\r\n2: {THIRD}");
    assert_eq!(rig.modem.last_text(), Some((PRIMARY, expected.as_str())));
    assert_eq!(rig.app.contacts().get(1), Some("+5561977776666"));
}

#[test]
fn reg_out_of_range_leaves_list_unchanged() {
    let mut rig = Rig::new();
    let before = rig.app.contacts().clone();

    rig.message(PRIMARY, "REG 5 +5561977776666");

    assert_eq!(rig.app.contacts(), &before);
    let expected = format!("0: {PRIMARY}\r\n1: {SECOND}\r\n2: {THIRD}");
    assert_eq!(rig.modem.last_text(), Some((PRIMARY, expected.as_str())));
}

#[test]
fn reg_with_malformed_argument_still_echoes() {
    let mut rig = Rig::new();
    let before = rig.app.contacts().clone();
    for body in ["REG", "REG +5561977776666", "REG X +5561977776666", "REG 1 CALLME"] {
        rig.message(PRIMARY, body);
        assert_eq!(rig.app.contacts(), &before, "{body}");
        assert!(rig.modem.last_text().unwrap().1.starts_with("0: "), "{body}");
    }
}

#[test]
fn reg_changes_who_gets_called() {
    let mut rig = Rig::new();
    rig.message(PRIMARY, "REG 0 +5561977776666");
    rig.set_siren(true);
    rig.settle();
    assert_eq!(rig.modem.calls, ["+5561977776666"]);
}

// ── RESTART ───────────────────────────────────────────────────

#[test]
fn restart_replies_then_requests_reset_once() {
    let mut rig = Rig::new();
    let slot = rig.message(PRIMARY, "RESTART");

    assert_eq!(rig.modem.last_text(), Some((PRIMARY, replies::RESTARTING)));
    assert_eq!(rig.modem.deleted, [slot]);
    assert!(rig.app.take_restart_request());
    assert!(!rig.app.take_restart_request());
}

#[test]
fn stranger_cannot_restart() {
    let mut rig = Rig::new();
    rig.message(STRANGER, "RESTART");
    assert!(!rig.app.take_restart_request());
}

// ── Inbox lifecycle ───────────────────────────────────────────

#[test]
fn delete_is_retried_until_it_succeeds() {
    let mut rig = Rig::new();
    rig.modem.delete_failures = 3;
    let slot = rig.message(PRIMARY, "STATUS");

    assert_eq!(rig.modem.deleted, [slot]);
    assert_eq!(rig.modem.delete_attempts, 4);
    assert_eq!(
        rig.sink.count(&AppEvent::TransportFailure {
            op: TransportOp::DeleteMessage,
            error: TransportError::Timeout,
        }),
        1
    );
}

#[test]
fn unreadable_message_is_still_deleted() {
    let mut rig = Rig::new();
    rig.modem.fail_read = true;
    let slot = rig.message(PRIMARY, "STATUS");
    assert!(rig.modem.sent.is_empty());
    assert_eq!(rig.modem.deleted, [slot]);
}

#[test]
fn send_failure_is_logged_not_fatal() {
    let mut rig = Rig::new();
    rig.modem.fail_send = true;
    let slot = rig.message(PRIMARY, "STATUS");
    assert_eq!(rig.modem.deleted, [slot]);
    assert!(rig.sink.saw(&AppEvent::TransportFailure {
        op: TransportOp::SendText,
        error: TransportError::Timeout,
    }));
}

#[test]
fn at_most_one_message_per_iteration() {
    let mut rig = Rig::new();
    rig.modem.deliver(PRIMARY, "STATUS");
    rig.modem.deliver(PRIMARY, "IMEI");
    rig.step(1);
    assert_eq!(rig.modem.deleted.len(), 1);
    rig.step(1);
    assert_eq!(rig.modem.deleted.len(), 2);
}

// ── Escalation ────────────────────────────────────────────────

#[test]
fn siren_escalates_through_rotation_until_it_stops() {
    let mut rig = Rig::new();
    rig.set_siren(true);
    rig.settle();

    assert_eq!(rig.modem.calls, [PRIMARY]);
    let s = rig.app.session();
    assert!(s.escalation_pending);
    assert_eq!(s.rotation_index, 1);
    assert_eq!(rig.app.timer().period_ms, Some(120_000));

    for _ in 0..3 {
        assert!(rig.fire_timer());
        rig.step(1);
    }
    assert_eq!(rig.modem.calls, [PRIMARY, SECOND, THIRD, PRIMARY]);

    rig.set_siren(false);
    rig.settle();

    let s = rig.app.session();
    assert!(!s.escalation_pending);
    assert_eq!(s.rotation_index, 0);
    assert!(!rig.app.timer().is_running());
    assert_eq!(rig.modem.texts_to(PRIMARY), [replies::SIREN_OFF]);
    assert_eq!(rig.sink.count(&AppEvent::EscalationStopped), 1);
}

#[test]
fn no_calls_between_ticks() {
    let mut rig = Rig::new();
    rig.set_siren(true);
    rig.settle();
    for _ in 0..10 {
        rig.step(20);
    }
    assert_eq!(rig.modem.calls.len(), 1);
}

#[test]
fn cancellation_beats_a_pending_tick() {
    let mut rig = Rig::new();
    rig.set_siren(true);
    rig.settle();
    assert!(rig.fire_timer());

    // Siren clears in the same iteration that would consume the tick.
    rig.set_siren(false);
    rig.settle();
    rig.step(1);

    assert_eq!(rig.modem.calls, [PRIMARY]);
    assert!(!rig.fire_timer(), "closed timer accepts no ticks");
}

#[test]
fn debounced_noise_never_escalates() {
    let mut rig = Rig::new();
    for (active, dt) in [(true, 500), (false, 400), (true, 50), (false, 40)] {
        rig.set_siren(active);
        rig.step(dt);
    }
    rig.settle();
    assert!(rig.modem.calls.is_empty());
    assert!(!rig.app.session().escalation_pending);
}

#[test]
fn escalation_starts_across_clock_wrap() {
    let mut rig = Rig::with_config(SystemConfig::default(), u32::MAX - 200);
    rig.set_siren(true);
    rig.step(300); // wraps; well under the debounce interval
    assert_eq!(rig.modem.calls, [PRIMARY]);
}

#[test]
fn blank_slot_is_skipped_without_stalling() {
    let mut config = SystemConfig::default();
    config.contacts[1] = Identity::new();
    let mut rig = Rig::with_config(config, 0);

    rig.set_siren(true);
    rig.settle();
    rig.fire_timer();
    rig.step(1);
    rig.fire_timer();
    rig.step(1);

    assert_eq!(rig.modem.calls, [PRIMARY, THIRD]);
    assert!(rig.sink.saw(&AppEvent::EscalationCall { slot: 1, ok: false }));
    assert!(rig.sink.saw(&AppEvent::TransportFailure {
        op: TransportOp::PlaceCall,
        error: TransportError::InvalidDestination,
    }));
}

// ── Arming grace ──────────────────────────────────────────────

#[test]
fn first_siren_after_armar_is_absorbed() {
    let mut rig = Rig::new();
    rig.message(PRIMARY, "ARMAR");
    assert!(!rig.app.session().arming_grace_consumed);

    rig.set_siren(true);
    rig.settle();
    assert!(rig.modem.calls.is_empty());
    assert!(rig.app.session().arming_grace_consumed);
    assert!(rig.sink.saw(&AppEvent::ArmingGraceApplied));

    // The primary still hears that the siren went quiet.
    rig.set_siren(false);
    rig.settle();
    assert_eq!(rig.modem.texts_to(PRIMARY), [replies::SIREN_OFF]);
    assert!(!rig.sink.saw(&AppEvent::EscalationStopped));

    // A second trigger inside the window is real.
    rig.set_siren(true);
    rig.settle();
    assert_eq!(rig.modem.calls, [PRIMARY]);
}

#[test]
fn grace_expires() {
    let mut rig = Rig::new();
    rig.message(PRIMARY, "ARMAR");
    rig.step(6000);
    rig.set_siren(true);
    rig.settle();
    assert_eq!(rig.modem.calls, [PRIMARY]);
}

#[test]
fn siren_without_armar_escalates_immediately() {
    let mut rig = Rig::new();
    rig.set_siren(true);
    rig.settle();
    assert!(rig.sink.saw(&AppEvent::EscalationStarted));
    assert!(!rig.sink.saw(&AppEvent::ArmingGraceApplied));
}

#[test]
fn expired_grace_does_not_come_back_after_clock_wrap() {
    let mut rig = Rig::with_config(SystemConfig::default(), 0);
    rig.message(PRIMARY, "ARMAR");
    let armed_at = rig.now;

    // Run the millisecond counter all the way round, polling as the loop does.
    rig.step(6000);
    rig.step(1 << 31);
    rig.step((1u32 << 31) - 6000);
    assert_eq!(rig.now, armed_at);

    rig.set_siren(true);
    rig.settle();
    assert_eq!(rig.modem.calls, [PRIMARY]);
    assert!(!rig.sink.saw(&AppEvent::ArmingGraceApplied));
}

// ── Timer faults ──────────────────────────────────────────────

#[test]
fn escalation_timer_start_failure_is_retried() {
    let mut rig = Rig::new();
    rig.app.timer_mut().fail_starts = 1;
    rig.set_siren(true);
    rig.settle();

    assert_eq!(rig.modem.calls, [PRIMARY]);
    assert!(rig.sink.saw(&AppEvent::EscalationTimerFailed(InitError::TimerStartFailed(-1))));
    let s = rig.app.session();
    assert!(!s.escalation_pending);
    assert!(s.escalation_stalled);
    assert!(!rig.app.timer().is_running());

    // Too soon for another attempt.
    rig.step(10);
    assert_eq!(rig.app.timer().starts, 1);

    rig.step(1000);
    assert_eq!(rig.app.timer().starts, 2);
    let s = rig.app.session();
    assert!(s.escalation_pending);
    assert!(!s.escalation_stalled);
    assert!(rig.app.timer().is_running());

    assert!(rig.fire_timer());
    rig.step(1);
    assert_eq!(rig.modem.calls, [PRIMARY, SECOND]);
}

#[test]
fn siren_clearing_ends_a_stalled_escalation() {
    let mut rig = Rig::new();
    rig.app.timer_mut().fail_starts = u32::MAX;
    rig.set_siren(true);
    rig.settle();
    rig.step(1000);
    assert_eq!(rig.app.timer().starts, 2);

    rig.set_siren(false);
    rig.settle();
    assert!(rig.sink.saw(&AppEvent::EscalationStopped));
    assert!(!rig.app.session().escalation_stalled);

    let starts = rig.app.timer().starts;
    rig.step(5000);
    assert_eq!(rig.app.timer().starts, starts, "no retries once the siren is off");
    assert_eq!(rig.modem.calls, [PRIMARY]);
}
