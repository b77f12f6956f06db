//! Linux X11 key injection via the XTest extension.
//!
//! Built only with the `xtest` cargo feature, because it links libX11 and
//! libXtst.
//!
//! X11 works in *KeySyms* (symbolic names such as `XK_a` = 0x0061) while
//! `XTestFakeKeyEvent` takes a server *keycode*, so every event goes through:
//!
//! ```text
//! HID Usage ID → X11 KeySym → XKeysymToKeycode(display, keysym) → XTestFakeKeyEvent
//! ```
//!
//! XTest needs access to the display named by `DISPLAY`; if it cannot be
//! opened the constructor fails and the binary falls back to the dry-run sink.

use std::ptr;
use std::sync::Mutex;

use osckey_core::keymap::{hid::HidKeyCode, KeyMapper};
use x11::{xlib, xtest};

use crate::application::input_sink::{EmulationError, InputSink};

/// `CurrentTime`: let the server timestamp the synthetic event.
const CURRENT_TIME: xlib::Time = 0;

struct DisplayHandle(*mut xlib::Display);

// SAFETY: the pointer is only dereferenced by Xlib while the surrounding
// Mutex is held, so calls are never concurrent.
unsafe impl Send for DisplayHandle {}

/// [`InputSink`] backed by `XTestFakeKeyEvent`.
pub struct XTestInputSink {
    display: Mutex<DisplayHandle>,
}

impl XTestInputSink {
    /// Opens the X display named by `DISPLAY`.
    ///
    /// # Errors
    ///
    /// Returns [`EmulationError::NotInitialized`] if the display cannot be
    /// opened.
    pub fn new() -> Result<Self, EmulationError> {
        // SAFETY: a null name asks Xlib to use the DISPLAY environment variable.
        let display = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display.is_null() {
            return Err(EmulationError::NotInitialized(
                "cannot open X display (is DISPLAY set?)".to_string(),
            ));
        }
        Ok(Self { display: Mutex::new(DisplayHandle(display)) })
    }

    fn fake_key(&self, key: HidKeyCode, is_press: bool) -> Result<(), EmulationError> {
        let keysym = KeyMapper::hid_to_x11_keysym(key).ok_or(EmulationError::InvalidKeyCode(key))?;
        let guard = self
            .display
            .lock()
            .map_err(|_| EmulationError::Platform("X display lock poisoned".to_string()))?;
        let display = guard.0;
        // SAFETY: display is a live connection owned by this sink; access is
        // serialised by the mutex.
        unsafe {
            let keycode = xlib::XKeysymToKeycode(display, xlib::KeySym::from(keysym));
            if keycode == 0 {
                return Err(EmulationError::Platform(format!(
                    "no keycode for keysym 0x{keysym:04X} in the current keymap"
                )));
            }
            let sent = xtest::XTestFakeKeyEvent(
                display,
                u32::from(keycode),
                i32::from(is_press),
                CURRENT_TIME,
            );
            xlib::XFlush(display);
            if sent == 0 {
                return Err(EmulationError::Platform("XTestFakeKeyEvent failed".to_string()));
            }
        }
        Ok(())
    }
}

impl InputSink for XTestInputSink {
    fn press_key(&self, key: HidKeyCode) -> Result<(), EmulationError> {
        self.fake_key(key, true)
    }

    fn release_key(&self, key: HidKeyCode) -> Result<(), EmulationError> {
        self.fake_key(key, false)
    }
}

impl Drop for XTestInputSink {
    fn drop(&mut self) {
        if let Ok(guard) = self.display.lock() {
            // SAFETY: the display was opened in `new` and is closed exactly once.
            unsafe {
                xlib::XCloseDisplay(guard.0);
            }
        }
    }
}
