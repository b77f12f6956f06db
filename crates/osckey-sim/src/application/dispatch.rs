//! The dispatcher: one tick of the OSC → key engine.
//!
//! Each [`Dispatcher::run_tick`] call:
//!
//! 1. applies console commands queued since the last tick,
//! 2. advances the timers (momentary auto-release, feedback fade),
//! 3. drains every inbound message in arrival order:
//!    - the enable/disable addresses flip the gate,
//!    - the root address, with the gate open and a bound identifier, marks the
//!      feedback indicator and (when keystrokes are allowed) triggers the key,
//!    - anything else is discarded with a `debug!` trace.
//!
//! All engine state lives in one [`EngineState`] owned by the dispatcher and
//! is only touched from the task that calls `run_tick`, so no locking is
//! needed.  Independent dispatchers can coexist, which the tests rely on.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use osckey_core::{keymap::hid::HidKeyCode, KeyMap, OscMessage};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace};

use crate::application::gate::GateFilter;
use crate::application::input_sink::InputSink;
use crate::application::timer::{FeedbackState, TimerService};
use crate::application::trigger::{TriggerEngine, TriggerOutcome, TriggerState, TriggerStrategy};

/// Source of decoded inbound messages.
///
/// Implementations must never block: `receive` returns `None` when nothing is
/// queued.
pub trait MessageTransport {
    fn has_pending(&self) -> bool;
    fn receive(&mut self) -> Option<OscMessage>;
}

/// The three OSC addresses the engine reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlAddresses {
    /// Trigger address; the first numeric argument is the binding identifier.
    pub root: String,
    pub enable: String,
    pub disable: String,
}

impl Default for ControlAddresses {
    fn default() -> Self {
        Self {
            root: "/key".to_string(),
            enable: "/enable".to_string(),
            disable: "/disable".to_string(),
        }
    }
}

/// Validated engine parameters, produced by the configuration layer.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub key_map: KeyMap,
    pub addresses: ControlAddresses,
    pub hold_duration: Duration,
    pub feedback_window_ticks: u32,
    pub toggle_mode: bool,
    pub gate_enabled: bool,
    pub keystrokes_allowed: bool,
}

/// Commands from the presentation layer, applied at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiCommand {
    SetGate(bool),
    ToggleGate,
    SetToggleMode(bool),
    ToggleMode,
    SetKeystrokesAllowed(bool),
}

/// All mutable engine state.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub gate: GateFilter,
    pub toggle_mode: bool,
    /// Global "allow synthetic keystrokes" switch.  When off, trigger messages
    /// still drive the feedback indicator but no key is pressed.
    pub keystrokes_allowed: bool,
    pub trigger: TriggerState,
    pub feedback: FeedbackState,
}

/// Serializable view of the engine for renderers and the status console.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub gate_enabled: bool,
    pub toggle_mode: bool,
    pub keystrokes_allowed: bool,
    pub receiving: bool,
    pub last_message_id: Option<i32>,
    pub last_label: Option<String>,
    pub fade_alpha: u8,
    pub held_keys: Vec<String>,
}

/// Summary of one tick, mostly for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub commands_applied: usize,
    pub messages: usize,
    pub discarded: usize,
    pub pressed: Vec<HidKeyCode>,
    pub released: Vec<HidKeyCode>,
    pub failures: usize,
    pub feedback_cleared: bool,
}

impl TickReport {
    /// `true` when the tick neither consumed input nor changed a key.
    pub fn is_quiet(&self) -> bool {
        self.commands_applied == 0
            && self.messages == 0
            && self.pressed.is_empty()
            && self.released.is_empty()
            && !self.feedback_cleared
    }
}

/// Owns the engine state and drives it from a [`MessageTransport`].
pub struct Dispatcher<T: MessageTransport> {
    key_map: KeyMap,
    addresses: ControlAddresses,
    engine: TriggerEngine,
    timers: TimerService,
    state: EngineState,
    transport: T,
    commands: VecDeque<UiCommand>,
}

impl<T: MessageTransport> Dispatcher<T> {
    pub fn new(settings: EngineSettings, sink: Arc<dyn InputSink>, transport: T) -> Self {
        let EngineSettings {
            key_map,
            addresses,
            hold_duration,
            feedback_window_ticks,
            toggle_mode,
            gate_enabled,
            keystrokes_allowed,
        } = settings;
        Self {
            key_map,
            addresses,
            engine: TriggerEngine::new(sink),
            timers: TimerService::new(hold_duration),
            state: EngineState {
                gate: GateFilter::new(gate_enabled),
                toggle_mode,
                keystrokes_allowed,
                trigger: TriggerState::new(),
                feedback: FeedbackState::new(feedback_window_ticks),
            },
            transport,
            commands: VecDeque::new(),
        }
    }

    // ── Tick ──────────────────────────────────────────────────────────────────

    /// Runs one tick at the current instant.
    pub fn run_tick(&mut self) -> TickReport {
        self.run_tick_at(Instant::now())
    }

    /// Runs one tick as if the clock read `now`.
    pub fn run_tick_at(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();

        while let Some(cmd) = self.commands.pop_front() {
            self.apply_command(cmd);
            report.commands_applied += 1;
        }

        let timer = self.timers.advance(
            &self.engine,
            &mut self.state.trigger,
            &mut self.state.feedback,
            now,
        );
        report.feedback_cleared = timer.feedback_cleared;
        if let Some(key) = timer.released {
            report.released.push(key);
        }
        if let Some(e) = timer.release_error {
            error!("auto-release failed: {e}");
            report.failures += 1;
        }

        while self.transport.has_pending() {
            let Some(msg) = self.transport.receive() else {
                break;
            };
            report.messages += 1;
            self.handle_message(msg, now, &mut report);
        }

        if !report.is_quiet() {
            trace!(?report, "tick");
        }
        report
    }

    fn handle_message(&mut self, msg: OscMessage, now: Instant, report: &mut TickReport) {
        // Control messages are honoured even while the gate is closed, or a
        // remotely disabled gate could never be reopened.
        if msg.address == self.addresses.enable {
            self.set_gate_enabled(true);
            return;
        }
        if msg.address == self.addresses.disable {
            self.set_gate_enabled(false);
            return;
        }
        if msg.address != self.addresses.root {
            debug!(address = %msg.address, "discarding message for unhandled address");
            report.discarded += 1;
            return;
        }
        if !self.state.gate.is_enabled() {
            debug!("gate disabled; discarding trigger");
            report.discarded += 1;
            return;
        }
        let Some(message_id) = msg.first_int_arg() else {
            debug!(args = ?msg.args, "trigger without a numeric identifier; discarding");
            report.discarded += 1;
            return;
        };
        let binding = match self.key_map.resolve(message_id) {
            Ok(binding) => binding,
            Err(e) => {
                debug!("{e}; discarding");
                report.discarded += 1;
                return;
            }
        };

        self.state.feedback.mark_received(message_id);
        if !self.state.keystrokes_allowed {
            debug!(message_id, "keystrokes not allowed; feedback only");
            return;
        }

        let strategy = TriggerStrategy::from_toggle_mode(self.state.toggle_mode);
        match self.engine.trigger(&mut self.state.trigger, strategy, binding, now) {
            Ok(TriggerOutcome::Pressed(key)) => report.pressed.push(key),
            Ok(TriggerOutcome::Released(key)) => report.released.push(key),
            Ok(TriggerOutcome::Ignored) => {}
            Err(e) => {
                error!(message_id, label = %binding.label, "key injection failed: {e}");
                report.failures += 1;
            }
        }
    }

    // ── Presentation ──────────────────────────────────────────────────────────

    /// Queues a command for the start of the next tick.
    pub fn queue_command(&mut self, cmd: UiCommand) {
        self.commands.push_back(cmd);
    }

    /// Applies a command immediately.
    pub fn apply_command(&mut self, cmd: UiCommand) {
        match cmd {
            UiCommand::SetGate(enabled) => self.set_gate_enabled(enabled),
            UiCommand::ToggleGate => self.set_gate_enabled(!self.is_gate_enabled()),
            UiCommand::SetToggleMode(toggle) => self.set_toggle_mode(toggle),
            UiCommand::ToggleMode => self.set_toggle_mode(!self.is_toggle_mode()),
            UiCommand::SetKeystrokesAllowed(allowed) => self.set_keystrokes_allowed(allowed),
        }
    }

    pub fn is_gate_enabled(&self) -> bool {
        self.state.gate.is_enabled()
    }

    /// Manual gate override.  Only real transitions are logged.
    pub fn set_gate_enabled(&mut self, enabled: bool) {
        if self.state.gate.set_enabled(enabled) {
            info!(enabled, "keystroke gate changed");
        }
    }

    pub fn is_toggle_mode(&self) -> bool {
        self.state.toggle_mode
    }

    /// Switches between momentary and toggle mode.
    ///
    /// Switching to a different mode first releases every key the engine
    /// holds, so no key is left stuck under rules that no longer apply.
    pub fn set_toggle_mode(&mut self, toggle_mode: bool) {
        if self.state.toggle_mode == toggle_mode {
            return;
        }
        self.release_all();
        self.state.toggle_mode = toggle_mode;
        let mode = if toggle_mode { "toggle" } else { "momentary" };
        info!(mode, "trigger mode changed");
    }

    pub fn keystrokes_allowed(&self) -> bool {
        self.state.keystrokes_allowed
    }

    pub fn set_keystrokes_allowed(&mut self, allowed: bool) {
        if self.state.keystrokes_allowed != allowed {
            self.state.keystrokes_allowed = allowed;
            info!(allowed, "synthetic keystrokes switch changed");
        }
    }

    pub fn current_feedback(&self) -> &FeedbackState {
        &self.state.feedback
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn key_map(&self) -> &KeyMap {
        &self.key_map
    }

    pub fn addresses(&self) -> &ControlAddresses {
        &self.addresses
    }

    /// Releases every held key.  Failures are logged, never retried.
    pub fn release_all(&mut self) -> Vec<HidKeyCode> {
        match self.engine.release_all(&mut self.state.trigger) {
            Ok(keys) => keys,
            Err(e) => {
                error!("failed to release held keys: {e}");
                Vec::new()
            }
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let feedback = &self.state.feedback;
        let last_label = feedback
            .last_message_id()
            .and_then(|id| self.key_map.resolve(id).ok())
            .map(|b| b.label.clone());
        EngineSnapshot {
            gate_enabled: self.state.gate.is_enabled(),
            toggle_mode: self.state.toggle_mode,
            keystrokes_allowed: self.state.keystrokes_allowed,
            receiving: feedback.is_receiving(),
            last_message_id: feedback.last_message_id(),
            last_label,
            fade_alpha: feedback.fade_alpha(),
            held_keys: self
                .state
                .trigger
                .held_keys()
                .into_iter()
                .map(|k| k.name().to_string())
                .collect(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
