//! macOS key injection via CoreGraphics.
//!
//! Each press or release builds a `CGEvent` keyboard event from a
//! HID-system-state event source and posts it at the session tap:
//!
//! ```text
//! HID Usage ID → CGKeyCode → CGEvent::new_keyboard_event → post(Session)
//! ```
//!
//! # Accessibility permission
//!
//! Posting synthetic events requires the Accessibility permission (System
//! Settings → Privacy & Security → Accessibility).  Without it macOS drops the
//! events silently, so a missing permission shows up as "nothing happens"
//! rather than as an error here.

#![cfg(target_os = "macos")]

use core_graphics::event::{CGEvent, CGEventTapLocation};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use osckey_core::keymap::{hid::HidKeyCode, KeyMapper};

use crate::application::input_sink::{EmulationError, InputSink};

/// [`InputSink`] backed by CoreGraphics event posting.
///
/// The event source is created per call: `CGEventSource` is not `Send`, and
/// the sink must be shareable across tasks.
#[derive(Debug)]
pub struct MacosInputSink {
    _private: (),
}

impl MacosInputSink {
    /// Creates the sink after checking an event source can be obtained.
    ///
    /// # Errors
    ///
    /// Returns [`EmulationError::NotInitialized`] if CoreGraphics refuses to
    /// create an event source.
    pub fn new() -> Result<Self, EmulationError> {
        event_source().map_err(|_| {
            EmulationError::NotInitialized("CGEventSource unavailable".to_string())
        })?;
        Ok(Self { _private: () })
    }

    fn post(&self, key: HidKeyCode, key_down: bool) -> Result<(), EmulationError> {
        let keycode =
            KeyMapper::hid_to_macos_cgkeycode(key).ok_or(EmulationError::InvalidKeyCode(key))?;
        let source = event_source()?;
        let event = CGEvent::new_keyboard_event(source, keycode, key_down).map_err(|()| {
            EmulationError::Platform(format!("could not create keyboard event for {key}"))
        })?;
        event.post(CGEventTapLocation::Session);
        Ok(())
    }
}

impl InputSink for MacosInputSink {
    fn press_key(&self, key: HidKeyCode) -> Result<(), EmulationError> {
        self.post(key, true)
    }

    fn release_key(&self, key: HidKeyCode) -> Result<(), EmulationError> {
        self.post(key, false)
    }
}

fn event_source() -> Result<CGEventSource, EmulationError> {
    CGEventSource::new(CGEventSourceStateID::HIDSystemState)
        .map_err(|()| EmulationError::Platform("could not create CGEventSource".to_string()))
}
