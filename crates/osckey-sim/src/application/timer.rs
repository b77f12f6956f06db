//! Per-tick timers: momentary auto-release and the "message received" fade.
//!
//! Nothing here schedules a callback.  Both timers are re-evaluated on every
//! dispatcher tick, so a missed tick simply delays the work to the next one.
//!
//! - The release deadline is wall-clock: a momentary key is released on the
//!   first tick at or after `pressed_at + hold_duration`.
//! - The feedback window is counted in ticks: the indicator stays up for
//!   `window_ticks` ticks after the last qualifying message and fades out
//!   linearly over that span.

use std::time::{Duration, Instant};

use osckey_core::keymap::hid::HidKeyCode;

use crate::application::input_sink::EmulationError;
use crate::application::trigger::{TriggerEngine, TriggerState};

/// Default hold duration of a momentary press.
pub const DEFAULT_HOLD_DURATION: Duration = Duration::from_millis(100);

/// Default feedback window, one second at 60 ticks per second.
pub const DEFAULT_FEEDBACK_WINDOW_TICKS: u32 = 60;

/// "Message just received" indicator state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackState {
    last_message_id: Option<i32>,
    elapsed_ticks: u32,
    window_ticks: u32,
    receiving: bool,
}

impl FeedbackState {
    /// Creates an inactive indicator.  A zero window is treated as one tick.
    pub fn new(window_ticks: u32) -> Self {
        Self {
            last_message_id: None,
            elapsed_ticks: 0,
            window_ticks: window_ticks.max(1),
            receiving: false,
        }
    }

    pub fn last_message_id(&self) -> Option<i32> {
        self.last_message_id
    }

    pub fn elapsed_ticks(&self) -> u32 {
        self.elapsed_ticks
    }

    pub fn window_ticks(&self) -> u32 {
        self.window_ticks
    }

    pub fn is_receiving(&self) -> bool {
        self.receiving
    }

    /// Restarts the window for `message_id`.
    pub fn mark_received(&mut self, message_id: i32) {
        self.last_message_id = Some(message_id);
        self.elapsed_ticks = 0;
        self.receiving = true;
    }

    /// Advances the window by one tick.
    ///
    /// Returns `true` on the tick the indicator resets to inactive.
    pub fn advance(&mut self) -> bool {
        if !self.receiving {
            return false;
        }
        self.elapsed_ticks = self.elapsed_ticks.saturating_add(1);
        if self.elapsed_ticks >= self.window_ticks {
            *self = Self::new(self.window_ticks);
            return true;
        }
        false
    }

    /// Opacity of the feedback label: 255 right after a message, falling
    /// linearly to 0 at the end of the window.
    pub fn fade_alpha(&self) -> u8 {
        if !self.receiving {
            return 0;
        }
        let remaining = self.window_ticks.saturating_sub(self.elapsed_ticks);
        // remaining <= window_ticks, so the quotient is at most 255.
        u8::try_from(255 * u64::from(remaining) / u64::from(self.window_ticks)).unwrap_or(u8::MAX)
    }
}

impl Default for FeedbackState {
    fn default() -> Self {
        Self::new(DEFAULT_FEEDBACK_WINDOW_TICKS)
    }
}

/// What one [`TimerService::advance`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerOutcome {
    /// Key auto-released this tick, if its deadline passed.
    pub released: Option<HidKeyCode>,
    /// Sink failure from the auto-release; the bookkeeping is cleared anyway.
    pub release_error: Option<EmulationError>,
    /// The feedback indicator reset this tick.
    pub feedback_cleared: bool,
}

/// Evaluates the release deadline and the feedback window once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerService {
    hold_duration: Duration,
}

impl TimerService {
    pub fn new(hold_duration: Duration) -> Self {
        Self { hold_duration }
    }

    pub fn hold_duration(&self) -> Duration {
        self.hold_duration
    }

    /// `true` once the pending momentary press has been held long enough.
    pub fn release_due(&self, state: &TriggerState, now: Instant) -> bool {
        state
            .active()
            .is_some_and(|a| now.saturating_duration_since(a.pressed_at) >= self.hold_duration)
    }

    /// Runs both timers for the tick at `now`.
    pub fn advance(
        &self,
        engine: &TriggerEngine,
        trigger: &mut TriggerState,
        feedback: &mut FeedbackState,
        now: Instant,
    ) -> TimerOutcome {
        let mut outcome = TimerOutcome {
            feedback_cleared: feedback.advance(),
            ..TimerOutcome::default()
        };
        if self.release_due(trigger, now) {
            match engine.release_active(trigger) {
                Ok(key) => outcome.released = key,
                Err(e) => outcome.release_error = Some(e),
            }
        }
        outcome
    }
}

impl Default for TimerService {
    fn default() -> Self {
        Self::new(DEFAULT_HOLD_DURATION)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
