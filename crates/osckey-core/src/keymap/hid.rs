//! USB HID Usage IDs (page 0x07, Keyboard/Keypad page).
//!
//! This is the canonical key representation inside the simulator.  Key names
//! from the settings file are parsed into a [`HidKeyCode`], and each platform
//! input sink translates it into the code its injection API expects.
//!
//! Reference: USB HID Usage Tables 1.3, Section 10 (Keyboard/Keypad page 0x07).
//!
//! # Why HID codes and not ASCII? (for beginners)
//!
//! HID codes name *physical key positions*.  Letter A is 0x04 whatever the
//! keyboard layout, whereas the character it produces depends on the layout and
//! the modifiers held down.  Binding an OSC identifier to a key position means
//! the simulator presses the same key a human operator would press.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::table::{row_for, KEY_TABLE};

/// USB HID Usage ID for keyboard keys (page 0x07).
///
/// The numeric value of each variant is its HID Usage ID on the keyboard/keypad page.
/// [`HidKeyCode::Unknown`] represents any key that has no mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum HidKeyCode {
    // Letters (HID 0x04–0x1D)
    KeyA = 0x04,
    KeyB = 0x05,
    KeyC = 0x06,
    KeyD = 0x07,
    KeyE = 0x08,
    KeyF = 0x09,
    KeyG = 0x0A,
    KeyH = 0x0B,
    KeyI = 0x0C,
    KeyJ = 0x0D,
    KeyK = 0x0E,
    KeyL = 0x0F,
    KeyM = 0x10,
    KeyN = 0x11,
    KeyO = 0x12,
    KeyP = 0x13,
    KeyQ = 0x14,
    KeyR = 0x15,
    KeyS = 0x16,
    KeyT = 0x17,
    KeyU = 0x18,
    KeyV = 0x19,
    KeyW = 0x1A,
    KeyX = 0x1B,
    KeyY = 0x1C,
    KeyZ = 0x1D,

    // Digits (HID 0x1E–0x27)
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,

    // Control keys (HID 0x28–0x38)
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    BracketLeft = 0x2F,
    BracketRight = 0x30,
    Backslash = 0x31,
    Semicolon = 0x33,
    Quote = 0x34,
    Backquote = 0x35,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,

    // Lock keys
    CapsLock = 0x39,

    // Function keys (HID 0x3A–0x45)
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // Navigation cluster (HID 0x46–0x52)
    PrintScreen = 0x46,
    ScrollLock = 0x47,
    Pause = 0x48,
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    ArrowRight = 0x4F,
    ArrowLeft = 0x50,
    ArrowDown = 0x51,
    ArrowUp = 0x52,

    // Numpad (HID 0x53–0x63)
    NumLock = 0x53,
    NumpadDivide = 0x54,
    NumpadMultiply = 0x55,
    NumpadSubtract = 0x56,
    NumpadAdd = 0x57,
    NumpadEnter = 0x58,
    Numpad1 = 0x59,
    Numpad2 = 0x5A,
    Numpad3 = 0x5B,
    Numpad4 = 0x5C,
    Numpad5 = 0x5D,
    Numpad6 = 0x5E,
    Numpad7 = 0x5F,
    Numpad8 = 0x60,
    Numpad9 = 0x61,
    Numpad0 = 0x62,
    NumpadDecimal = 0x63,

    // Application key (HID 0x65)
    ContextMenu = 0x65,

    // Modifier keys (HID 0xE0–0xE7)
    ControlLeft = 0xE0,
    ShiftLeft = 0xE1,
    AltLeft = 0xE2,
    MetaLeft = 0xE3,
    ControlRight = 0xE4,
    ShiftRight = 0xE5,
    AltRight = 0xE6,
    MetaRight = 0xE7,

    /// Sentinel for keys with no HID mapping.
    Unknown = 0x0000,
}

/// Error returned when a key name from the settings file is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown key name: {0:?}")]
pub struct UnknownKeyName(pub String);

impl HidKeyCode {
    /// Converts a raw u16 HID Usage ID to a [`HidKeyCode`].
    ///
    /// Returns [`HidKeyCode::Unknown`] if the value is not a known key.
    pub fn from_u16(value: u16) -> Self {
        KEY_TABLE
            .iter()
            .find(|row| row.hid.as_u16() == value)
            .map_or(HidKeyCode::Unknown, |row| row.hid)
    }

    /// Returns the raw USB HID Usage ID value for this key code.
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Parses a key name as written in the settings file.
    ///
    /// Matching is case-insensitive.  Every key accepts its canonical name
    /// (`"a"`, `"enter"`, `"f5"`, `"up"`, `"num7"`), a few common aliases
    /// (`"return"`, `"esc"`, `"cmd"`), and its variant name (`"ArrowUp"`).
    /// Single printable characters are accepted for punctuation (`"-"`, `"/"`).
    pub fn from_name(name: &str) -> Option<Self> {
        // Space is the only key whose single-character name is whitespace.
        let trimmed = if name == " " { name } else { name.trim() };
        if trimmed.is_empty() {
            return None;
        }
        KEY_TABLE
            .iter()
            .find(|row| {
                row.names.iter().any(|n| n.eq_ignore_ascii_case(trimmed))
                    || format!("{:?}", row.hid).eq_ignore_ascii_case(trimmed)
            })
            .map(|row| row.hid)
    }

    /// Returns the canonical settings-file name of this key, or `"unknown"`.
    pub fn name(self) -> &'static str {
        row_for(self)
            .and_then(|row| row.names.first().copied())
            .unwrap_or("unknown")
    }

    /// Returns `true` if this is a modifier key.
    pub fn is_modifier(self) -> bool {
        (0xE0..=0xE7).contains(&self.as_u16())
    }
}

impl FromStr for HidKeyCode {
    type Err = UnknownKeyName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownKeyName(s.to_string()))
    }
}

impl fmt::Display for HidKeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
