//! Key names and key code translation tables.
//!
//! The canonical representation is USB HID Usage IDs (page 0x07, Keyboard/Keypad).
//! Key names from the settings file are parsed into HID codes, and HID codes
//! are translated to platform codes at the injection boundary.

pub mod hid;
pub mod table;

pub use hid::{HidKeyCode, UnknownKeyName};

use table::row_for;

/// Unified key mapper providing the HID → native translation directions.
pub struct KeyMapper;

impl KeyMapper {
    /// Translates a [`HidKeyCode`] to a Windows Virtual Key code.
    ///
    /// Returns `None` if the HID code has no Windows VK equivalent.
    pub fn hid_to_windows_vk(hid: HidKeyCode) -> Option<u8> {
        row_for(hid).and_then(|row| row.vk)
    }

    /// Translates a [`HidKeyCode`] to an X11 KeySym value for Linux.
    ///
    /// Returns `None` if the HID code has no X11 equivalent.
    pub fn hid_to_x11_keysym(hid: HidKeyCode) -> Option<u32> {
        row_for(hid).and_then(|row| row.x11)
    }

    /// Translates a [`HidKeyCode`] to a macOS `CGKeyCode` value.
    ///
    /// Returns `None` if the HID code has no macOS equivalent.
    pub fn hid_to_macos_cgkeycode(hid: HidKeyCode) -> Option<u16> {
        row_for(hid).and_then(|row| row.cg)
    }
}
