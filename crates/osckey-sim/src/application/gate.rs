//! The enable/disable gate for synthetic keystrokes.

/// Whether trigger messages are currently permitted.
///
/// Flipped by the enable/disable control addresses and by the manual override
/// from the console.  Trigger messages that arrive while the gate is closed are
/// dropped, never queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateFilter {
    enabled: bool,
}

impl GateFilter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Overwrites the gate state.
    ///
    /// Returns `true` if the value actually changed, so callers can log only
    /// real transitions.  Setting the current value again has no effect.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        let changed = self.enabled != enabled;
        self.enabled = enabled;
        changed
    }
}

impl Default for GateFilter {
    fn default() -> Self {
        Self::new(true)
    }
}
