//! Integration tests for the OSC → key pipeline.
//!
//! These tests exercise the application layer of osckey-sim end-to-end:
//! `Dispatcher` + `ChannelTransport` + `RecordingInputSink`, with settings
//! built from a TOML string the same way the binary builds them.  Time is
//! driven explicitly through `run_tick_at`, so nothing here sleeps.

use std::sync::Arc;
use std::time::{Duration, Instant};

use osckey_core::{keymap::hid::HidKeyCode, OscArg, OscMessage};
use osckey_sim::application::dispatch::{Dispatcher, EngineSettings, UiCommand};
use osckey_sim::infrastructure::{
    input_emulation::mock::{RecordingInputSink, SinkEvent},
    network::ChannelTransport,
    storage::config::AppConfig,
};
use tokio::sync::mpsc::UnboundedSender;

// ── Helpers ───────────────────────────────────────────────────────────────────

const SETTINGS: &str = r#"
[keys]
duration_ms = 500

[feedback]
window_ticks = 3

[[bindings]]
osc_id = 3
key = "a"

[[bindings]]
osc_id = 4
key = "b"
"#;

fn settings(toggle_mode: bool) -> EngineSettings {
    let mut cfg = AppConfig::from_toml_str(SETTINGS).expect("test settings parse");
    cfg.keys.toggle_mode = toggle_mode;
    cfg.engine_settings().expect("test settings are valid")
}

struct Harness {
    sink: Arc<RecordingInputSink>,
    tx: UnboundedSender<OscMessage>,
    dispatcher: Dispatcher<ChannelTransport>,
    t0: Instant,
}

impl Harness {
    fn new(toggle_mode: bool) -> Self {
        let sink = Arc::new(RecordingInputSink::new());
        let (tx, transport) = ChannelTransport::pair();
        let dispatcher = Dispatcher::new(settings(toggle_mode), sink.clone(), transport);
        Self { sink, tx, dispatcher, t0: Instant::now() }
    }

    fn send(&self, msg: OscMessage) {
        self.tx.send(msg).expect("transport open");
    }

    fn trigger(&self, id: i32) {
        self.send(OscMessage::new("/key", vec![OscArg::Int(id)]));
    }

    fn tick_at_ms(&mut self, ms: u64) -> osckey_sim::application::dispatch::TickReport {
        self.dispatcher.run_tick_at(self.t0 + Duration::from_millis(ms))
    }
}

// ── Momentary mode ────────────────────────────────────────────────────────────

#[test]
fn test_momentary_press_is_held_then_released_after_hold_duration() {
    // Arrange
    let mut h = Harness::new(false);

    // Act: trigger at t=0
    h.trigger(3);
    let report = h.tick_at_ms(0);

    // Assert
    assert_eq!(report.pressed, vec![HidKeyCode::KeyA]);
    let active = h.dispatcher.state().trigger.active().expect("momentary press pending");
    assert_eq!(active.key_code, HidKeyCode::KeyA);
    assert_eq!(active.pressed_at, h.t0);

    // Retrigger inside the hold window has no effect.
    h.trigger(3);
    let report = h.tick_at_ms(100);
    assert!(report.pressed.is_empty());
    assert!(report.released.is_empty());
    assert_eq!(h.sink.presses(), vec![HidKeyCode::KeyA]);

    // Still held just before the deadline.
    assert!(h.tick_at_ms(499).released.is_empty());

    // Released exactly at the deadline.
    let report = h.tick_at_ms(500);
    assert_eq!(report.released, vec![HidKeyCode::KeyA]);
    assert_eq!(
        h.sink.events(),
        vec![SinkEvent::Press(HidKeyCode::KeyA), SinkEvent::Release(HidKeyCode::KeyA)]
    );
    assert!(h.dispatcher.state().trigger.is_idle());
}

#[test]
fn test_momentary_never_presses_twice_without_a_release() {
    // Arrange
    let mut h = Harness::new(false);

    // Act: a burst of triggers for two different keys across several ticks
    for step in 0..20u64 {
        h.trigger(if step % 2 == 0 { 3 } else { 4 });
        h.tick_at_ms(step * 60);
    }
    h.tick_at_ms(10_000);

    // Assert: presses and releases strictly alternate
    let events = h.sink.events();
    assert!(!events.is_empty());
    for pair in events.chunks(2) {
        match pair {
            [SinkEvent::Press(p), SinkEvent::Release(r)] => assert_eq!(p, r),
            other => panic!("unexpected event sequence {other:?}"),
        }
    }
    assert!(h.dispatcher.state().trigger.is_idle());
}

// ── Toggle mode ───────────────────────────────────────────────────────────────

#[test]
fn test_toggle_mode_alternates_press_and_release() {
    // Arrange
    let mut h = Harness::new(true);

    // Act
    h.trigger(3);
    let first = h.tick_at_ms(0);
    h.trigger(3);
    let second = h.tick_at_ms(10);

    // Assert
    assert_eq!(first.pressed, vec![HidKeyCode::KeyA]);
    assert_eq!(second.released, vec![HidKeyCode::KeyA]);
    assert!(h.dispatcher.state().trigger.toggled().is_empty());

    // No timer releases in toggle mode, however long we wait.
    h.trigger(4);
    h.tick_at_ms(20);
    assert!(h.tick_at_ms(60_000).released.is_empty());
    assert_eq!(h.dispatcher.snapshot().held_keys, vec!["b".to_string()]);
}

// ── Gate and filtering ────────────────────────────────────────────────────────

#[test]
fn test_disable_message_closes_gate_before_trigger() {
    // Arrange
    let mut h = Harness::new(false);

    // Act
    h.send(OscMessage::new("/disable", vec![]));
    h.trigger(3);
    let report = h.tick_at_ms(0);

    // Assert
    assert!(!h.dispatcher.is_gate_enabled());
    assert!(report.pressed.is_empty());
    assert!(h.sink.events().is_empty());
    assert!(!h.dispatcher.current_feedback().is_receiving());
    assert_eq!(h.dispatcher.current_feedback().last_message_id(), None);
}

#[test]
fn test_unmapped_identifier_is_ignored() {
    // Arrange
    let mut h = Harness::new(false);

    // Act
    h.trigger(99);
    let report = h.tick_at_ms(0);

    // Assert
    assert_eq!(report.messages, 1);
    assert_eq!(report.discarded, 1);
    assert!(h.sink.events().is_empty());
    assert!(h.dispatcher.state().trigger.is_idle());
    assert!(!h.dispatcher.current_feedback().is_receiving());
}

#[test]
fn test_enable_then_trigger_in_same_batch_is_honoured_in_order() {
    // Arrange
    let mut h = Harness::new(false);
    h.dispatcher.set_gate_enabled(false);

    // Act
    h.send(OscMessage::new("/enable", vec![]));
    h.trigger(3);
    let report = h.tick_at_ms(0);

    // Assert
    assert!(h.dispatcher.is_gate_enabled());
    assert_eq!(report.pressed, vec![HidKeyCode::KeyA]);
}

#[test]
fn test_unhandled_addresses_and_bad_arguments_are_discarded() {
    let mut h = Harness::new(false);

    h.send(OscMessage::new("/other", vec![OscArg::Int(3)]));
    h.send(OscMessage::new("/key", vec![OscArg::String("3".to_string())]));
    h.send(OscMessage::new("/key", vec![]));
    let report = h.tick_at_ms(0);

    assert_eq!(report.messages, 3);
    assert_eq!(report.discarded, 3);
    assert!(h.sink.events().is_empty());
}

#[test]
fn test_float_identifier_is_truncated_to_binding() {
    let mut h = Harness::new(false);

    h.send(OscMessage::new("/key", vec![OscArg::Float(4.0)]));
    let report = h.tick_at_ms(0);

    assert_eq!(report.pressed, vec![HidKeyCode::KeyB]);
}

// ── Feedback ──────────────────────────────────────────────────────────────────

#[test]
fn test_feedback_fades_and_clears_after_window() {
    // Arrange
    let mut h = Harness::new(true);

    // Act
    h.trigger(4);
    h.tick_at_ms(0);

    // Assert
    let snap = h.dispatcher.snapshot();
    assert!(snap.receiving);
    assert_eq!(snap.last_label.as_deref(), Some("b"));
    assert_eq!(snap.fade_alpha, 255);

    h.tick_at_ms(16);
    let faded = h.dispatcher.snapshot().fade_alpha;
    assert!(faded < 255 && faded > 0, "alpha {faded} should be fading");

    h.tick_at_ms(32);
    let report = h.tick_at_ms(48);
    assert!(report.feedback_cleared);
    assert!(!h.dispatcher.snapshot().receiving);
    assert_eq!(h.dispatcher.snapshot().fade_alpha, 0);
}

#[test]
fn test_keystrokes_disallowed_still_marks_feedback() {
    let mut h = Harness::new(false);
    h.dispatcher.queue_command(UiCommand::SetKeystrokesAllowed(false));

    h.trigger(3);
    h.tick_at_ms(0);

    assert!(h.sink.events().is_empty());
    assert_eq!(h.dispatcher.current_feedback().last_message_id(), Some(3));
}

// ── Mode switches ─────────────────────────────────────────────────────────────

#[test]
fn test_switching_to_momentary_releases_toggle_held_keys() {
    // Arrange
    let mut h = Harness::new(true);
    h.trigger(3);
    h.trigger(4);
    h.tick_at_ms(0);
    assert_eq!(h.dispatcher.state().trigger.toggled().len(), 2);

    // Act
    h.dispatcher.queue_command(UiCommand::ToggleMode);
    let report = h.tick_at_ms(10);

    // Assert
    assert_eq!(report.commands_applied, 1);
    assert!(!h.dispatcher.is_toggle_mode());
    assert!(h.dispatcher.state().trigger.is_idle());
    let mut released = h.sink.releases();
    released.sort_by_key(|k| k.as_u16());
    assert_eq!(released, vec![HidKeyCode::KeyA, HidKeyCode::KeyB]);
}

#[test]
fn test_switching_to_toggle_releases_pending_momentary_press() {
    // Arrange
    let mut h = Harness::new(false);
    h.trigger(3);
    h.tick_at_ms(0);

    // Act
    h.dispatcher.set_toggle_mode(true);

    // Assert: released now, and the timer has nothing left to do
    assert_eq!(h.sink.releases(), vec![HidKeyCode::KeyA]);
    assert!(h.tick_at_ms(1_000).released.is_empty());
    assert_eq!(h.sink.releases().len(), 1);
}

// ── Failure paths ─────────────────────────────────────────────────────────────

#[test]
fn test_failed_press_is_reported_and_leaves_engine_idle() {
    // Arrange
    let mut h = Harness::new(false);
    h.sink.set_fail(true);

    // Act
    h.trigger(3);
    let report = h.tick_at_ms(0);

    // Assert
    assert_eq!(report.failures, 1);
    assert!(report.pressed.is_empty());
    assert!(h.dispatcher.state().trigger.is_idle());

    // The next trigger works once the sink recovers.
    h.sink.set_fail(false);
    h.trigger(3);
    assert_eq!(h.tick_at_ms(10).pressed, vec![HidKeyCode::KeyA]);
}

#[test]
fn test_failed_auto_release_still_clears_pending_press() {
    // Arrange
    let mut h = Harness::new(false);
    h.trigger(3);
    h.tick_at_ms(0);
    h.sink.set_fail(true);

    // Act
    let report = h.tick_at_ms(500);

    // Assert
    assert_eq!(report.failures, 1);
    assert!(h.dispatcher.state().trigger.is_idle());
}

#[test]
fn test_release_all_on_shutdown_empties_held_keys() {
    let mut h = Harness::new(true);
    h.trigger(3);
    h.tick_at_ms(0);

    let released = h.dispatcher.release_all();

    assert_eq!(released, vec![HidKeyCode::KeyA]);
    assert!(h.dispatcher.snapshot().held_keys.is_empty());
}
