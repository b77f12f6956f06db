//! Press/release state machine for triggered keys.
//!
//! Two strategies share one entry point, [`TriggerEngine::trigger`]:
//!
//! - **Momentary**: press once, let the timer release it after the hold
//!   duration.  While a momentary press is in flight, further triggers are
//!   ignored (at most one active press system-wide).
//! - **Toggle**: the first trigger presses and holds the key, the second
//!   releases it.  Nothing is released automatically.
//!
//! The bookkeeping lives in [`TriggerState`], which the dispatcher owns and
//! passes in by reference.  The engine itself only holds the output sink.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use osckey_core::{keymap::hid::HidKeyCode, KeyBinding};
use tracing::{debug, info};

use crate::application::input_sink::{EmulationError, InputSink};

/// Which press/release rule applies to a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerStrategy {
    Momentary,
    Toggle,
}

impl TriggerStrategy {
    /// Selects the strategy for the current mode flag.
    pub fn from_toggle_mode(toggle_mode: bool) -> Self {
        if toggle_mode {
            Self::Toggle
        } else {
            Self::Momentary
        }
    }
}

/// The single in-flight momentary press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveAction {
    pub key_code: HidKeyCode,
    pub pressed_at: Instant,
}

/// Keys currently held down in toggle mode.  A code appears at most once.
pub type ToggleSet = HashSet<HidKeyCode>;

/// Pressed-key bookkeeping for both strategies.
#[derive(Debug, Clone, Default)]
pub struct TriggerState {
    toggled: ToggleSet,
    active: Option<ActiveAction>,
}

impl TriggerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pending momentary press, if any.
    pub fn active(&self) -> Option<&ActiveAction> {
        self.active.as_ref()
    }

    /// Keys held by toggle mode.
    pub fn toggled(&self) -> &ToggleSet {
        &self.toggled
    }

    /// Every key this engine currently holds down, ordered by HID code.
    pub fn held_keys(&self) -> Vec<HidKeyCode> {
        let mut keys: Vec<HidKeyCode> = self.toggled.iter().copied().collect();
        if let Some(active) = &self.active {
            if !self.toggled.contains(&active.key_code) {
                keys.push(active.key_code);
            }
        }
        keys.sort_by_key(|k| k.as_u16());
        keys
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.toggled.is_empty()
    }
}

/// Result of one [`TriggerEngine::trigger`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Pressed(HidKeyCode),
    Released(HidKeyCode),
    /// A momentary press was already in flight.
    Ignored,
}

/// Drives the [`InputSink`] according to the selected [`TriggerStrategy`].
pub struct TriggerEngine {
    sink: Arc<dyn InputSink>,
}

impl TriggerEngine {
    pub fn new(sink: Arc<dyn InputSink>) -> Self {
        Self { sink }
    }

    /// Applies `strategy` to `binding`.
    ///
    /// A failed press leaves `state` unchanged.  A failed release still clears
    /// the bookkeeping so the engine cannot wedge on a key the OS refused.
    ///
    /// # Errors
    ///
    /// Returns the sink's [`EmulationError`]; the caller logs it and does not
    /// retry.
    pub fn trigger(
        &self,
        state: &mut TriggerState,
        strategy: TriggerStrategy,
        binding: &KeyBinding,
        now: Instant,
    ) -> Result<TriggerOutcome, EmulationError> {
        let key = binding.key_code;
        match strategy {
            TriggerStrategy::Momentary => {
                if let Some(active) = &state.active {
                    debug!(
                        message_id = binding.message_id,
                        active = %active.key_code,
                        "momentary press already in flight; ignoring trigger"
                    );
                    return Ok(TriggerOutcome::Ignored);
                }
                self.sink.press_key(key)?;
                state.active = Some(ActiveAction { key_code: key, pressed_at: now });
                info!(key = %key, label = %binding.label, "key pressed (momentary)");
                Ok(TriggerOutcome::Pressed(key))
            }
            TriggerStrategy::Toggle => {
                if state.toggled.remove(&key) {
                    let result = self.sink.release_key(key);
                    info!(key = %key, label = %binding.label, "key released (toggle)");
                    result.map(|()| TriggerOutcome::Released(key))
                } else {
                    self.sink.press_key(key)?;
                    state.toggled.insert(key);
                    info!(key = %key, label = %binding.label, "key held (toggle)");
                    Ok(TriggerOutcome::Pressed(key))
                }
            }
        }
    }

    /// Releases the pending momentary press, if any.
    ///
    /// `ActiveAction` is cleared even when the sink fails.
    ///
    /// # Errors
    ///
    /// Returns the sink's [`EmulationError`] from the release call.
    pub fn release_active(&self, state: &mut TriggerState) -> Result<Option<HidKeyCode>, EmulationError> {
        let Some(active) = state.active.take() else {
            return Ok(None);
        };
        let key = active.key_code;
        if state.toggled.contains(&key) {
            // Still held by toggle mode; only the momentary claim ends.
            return Ok(Some(key));
        }
        self.sink.release_key(key)?;
        info!(key = %key, "key released (momentary)");
        Ok(Some(key))
    }

    /// Releases the pending momentary press and every toggle-held key.
    ///
    /// Every release is attempted even if an earlier one fails; the
    /// bookkeeping ends up empty either way.  Returns the keys that were
    /// released successfully.
    ///
    /// # Errors
    ///
    /// Returns the first [`EmulationError`] encountered.
    pub fn release_all(&self, state: &mut TriggerState) -> Result<Vec<HidKeyCode>, EmulationError> {
        let keys = state.held_keys();
        state.active = None;
        state.toggled.clear();

        let mut released = Vec::with_capacity(keys.len());
        let mut first_error = None;
        for key in keys {
            match self.sink.release_key(key) {
                Ok(()) => released.push(key),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        if !released.is_empty() {
            info!(count = released.len(), "released all held keys");
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(released),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
