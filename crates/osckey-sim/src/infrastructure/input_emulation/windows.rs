//! Windows key injection via the SendInput API.
//!
//! HID usage IDs are translated to Virtual Key codes and injected as
//! `KEYBDINPUT` events.  Navigation keys, the right-hand modifiers and the
//! Windows keys need `KEYEVENTF_EXTENDEDKEY` or Windows reports them as their
//! numpad/left-hand twins.

#![cfg(target_os = "windows")]

use osckey_core::keymap::{hid::HidKeyCode, KeyMapper};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, VIRTUAL_KEY,
};

use crate::application::input_sink::{EmulationError, InputSink};

/// VK codes that must carry `KEYEVENTF_EXTENDEDKEY`.
const EXTENDED_VKS: &[u8] = &[
    0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28, // PgUp/PgDn/End/Home/arrows
    0x2D, 0x2E, // Insert, Delete
    0x5B, 0x5C, 0x5D, // Win keys, Apps
    0x6F, // Numpad divide
    0xA3, 0xA5, // Right Ctrl, Right Alt
];

/// [`InputSink`] backed by `SendInput`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsInputSink;

impl WindowsInputSink {
    pub fn new() -> Self {
        Self
    }
}

impl InputSink for WindowsInputSink {
    fn press_key(&self, key: HidKeyCode) -> Result<(), EmulationError> {
        let vk = KeyMapper::hid_to_windows_vk(key).ok_or(EmulationError::InvalidKeyCode(key))?;
        send_key(vk, false)
    }

    fn release_key(&self, key: HidKeyCode) -> Result<(), EmulationError> {
        let vk = KeyMapper::hid_to_windows_vk(key).ok_or(EmulationError::InvalidKeyCode(key))?;
        send_key(vk, true)
    }
}

fn key_flags(vk: u8, key_up: bool) -> KEYBD_EVENT_FLAGS {
    let mut flags = KEYBD_EVENT_FLAGS(0);
    if key_up {
        flags |= KEYEVENTF_KEYUP;
    }
    if EXTENDED_VKS.contains(&vk) {
        flags |= KEYEVENTF_EXTENDEDKEY;
    }
    flags
}

fn send_key(vk: u8, key_up: bool) -> Result<(), EmulationError> {
    let input = INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(u16::from(vk)),
                wScan: 0,
                dwFlags: key_flags(vk, key_up),
                time: 0,
                dwExtraInfo: 0,
            },
        },
    };
    // SAFETY: input is a fully initialised KEYBDINPUT and cbSize matches INPUT.
    let inserted = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
    if inserted == 0 {
        let err = windows::core::Error::from_win32();
        return Err(EmulationError::Platform(format!("SendInput rejected VK 0x{vk:02X}: {err}")));
    }
    Ok(())
}
