//! Consolidated key table: settings-file names and native platform codes.
//!
//! One row per supported key.  Each row carries the names accepted in the
//! settings file and the code every platform injection API expects:
//!
//! | Column | Platform | Source                                   |
//! |--------|----------|------------------------------------------|
//! | `vk`   | Windows  | Virtual-Key codes (`winuser.h`)          |
//! | `x11`  | Linux    | X11 KeySyms (`X11/keysymdef.h`)          |
//! | `cg`   | macOS    | `CGKeyCode` (HIToolbox `Events.h`)       |
//!
//! Letters use lowercase X11 KeySyms; XTest applies Shift itself.  macOS codes
//! are ANSI key positions, not characters.  Windows has no distinct VK for the
//! numpad Enter key, so that column is `None` there.

use super::hid::HidKeyCode;

/// A single key: its HID code, accepted names, and native codes.
#[derive(Debug, Clone, Copy)]
pub struct KeyRow {
    pub hid: HidKeyCode,
    /// Settings-file names; the first one is canonical.
    pub names: &'static [&'static str],
    pub vk: Option<u8>,
    pub x11: Option<u32>,
    pub cg: Option<u16>,
}

const fn row(
    hid: HidKeyCode,
    names: &'static [&'static str],
    vk: Option<u8>,
    x11: Option<u32>,
    cg: Option<u16>,
) -> KeyRow {
    KeyRow { hid, names, vk, x11, cg }
}

/// Returns the table row for `hid`, or `None` for [`HidKeyCode::Unknown`].
pub fn row_for(hid: HidKeyCode) -> Option<&'static KeyRow> {
    KEY_TABLE.iter().find(|row| row.hid == hid)
}

/// Every key the simulator can press, in HID Usage ID order.
pub static KEY_TABLE: &[KeyRow] = {
    use HidKeyCode::*;
    &[
        row(KeyA, &["a"], Some(0x41), Some(0x0061), Some(0x00)),
        row(KeyB, &["b"], Some(0x42), Some(0x0062), Some(0x0B)),
        row(KeyC, &["c"], Some(0x43), Some(0x0063), Some(0x08)),
        row(KeyD, &["d"], Some(0x44), Some(0x0064), Some(0x02)),
        row(KeyE, &["e"], Some(0x45), Some(0x0065), Some(0x0E)),
        row(KeyF, &["f"], Some(0x46), Some(0x0066), Some(0x03)),
        row(KeyG, &["g"], Some(0x47), Some(0x0067), Some(0x05)),
        row(KeyH, &["h"], Some(0x48), Some(0x0068), Some(0x04)),
        row(KeyI, &["i"], Some(0x49), Some(0x0069), Some(0x22)),
        row(KeyJ, &["j"], Some(0x4A), Some(0x006A), Some(0x26)),
        row(KeyK, &["k"], Some(0x4B), Some(0x006B), Some(0x28)),
        row(KeyL, &["l"], Some(0x4C), Some(0x006C), Some(0x25)),
        row(KeyM, &["m"], Some(0x4D), Some(0x006D), Some(0x2E)),
        row(KeyN, &["n"], Some(0x4E), Some(0x006E), Some(0x2D)),
        row(KeyO, &["o"], Some(0x4F), Some(0x006F), Some(0x1F)),
        row(KeyP, &["p"], Some(0x50), Some(0x0070), Some(0x23)),
        row(KeyQ, &["q"], Some(0x51), Some(0x0071), Some(0x0C)),
        row(KeyR, &["r"], Some(0x52), Some(0x0072), Some(0x0F)),
        row(KeyS, &["s"], Some(0x53), Some(0x0073), Some(0x01)),
        row(KeyT, &["t"], Some(0x54), Some(0x0074), Some(0x11)),
        row(KeyU, &["u"], Some(0x55), Some(0x0075), Some(0x20)),
        row(KeyV, &["v"], Some(0x56), Some(0x0076), Some(0x09)),
        row(KeyW, &["w"], Some(0x57), Some(0x0077), Some(0x0D)),
        row(KeyX, &["x"], Some(0x58), Some(0x0078), Some(0x07)),
        row(KeyY, &["y"], Some(0x59), Some(0x0079), Some(0x10)),
        row(KeyZ, &["z"], Some(0x5A), Some(0x007A), Some(0x06)),
        row(Digit1, &["1"], Some(0x31), Some(0x0031), Some(0x12)),
        row(Digit2, &["2"], Some(0x32), Some(0x0032), Some(0x13)),
        row(Digit3, &["3"], Some(0x33), Some(0x0033), Some(0x14)),
        row(Digit4, &["4"], Some(0x34), Some(0x0034), Some(0x15)),
        row(Digit5, &["5"], Some(0x35), Some(0x0035), Some(0x17)),
        row(Digit6, &["6"], Some(0x36), Some(0x0036), Some(0x16)),
        row(Digit7, &["7"], Some(0x37), Some(0x0037), Some(0x1A)),
        row(Digit8, &["8"], Some(0x38), Some(0x0038), Some(0x1C)),
        row(Digit9, &["9"], Some(0x39), Some(0x0039), Some(0x19)),
        row(Digit0, &["0"], Some(0x30), Some(0x0030), Some(0x1D)),
        row(Enter, &["enter", "return"], Some(0x0D), Some(0xFF0D), Some(0x24)),
        row(Escape, &["escape", "esc"], Some(0x1B), Some(0xFF1B), Some(0x35)),
        row(Backspace, &["backspace"], Some(0x08), Some(0xFF08), Some(0x33)),
        row(Tab, &["tab"], Some(0x09), Some(0xFF09), Some(0x30)),
        row(Space, &["space", " "], Some(0x20), Some(0x0020), Some(0x31)),
        row(Minus, &["minus", "-"], Some(0xBD), Some(0x002D), Some(0x1B)),
        row(Equal, &["equal", "="], Some(0xBB), Some(0x003D), Some(0x18)),
        row(BracketLeft, &["bracketleft", "["], Some(0xDB), Some(0x005B), Some(0x21)),
        row(BracketRight, &["bracketright", "]"], Some(0xDD), Some(0x005D), Some(0x1E)),
        row(Backslash, &["backslash", "\\"], Some(0xDC), Some(0x005C), Some(0x2A)),
        row(Semicolon, &["semicolon", ";"], Some(0xBA), Some(0x003B), Some(0x29)),
        row(Quote, &["quote", "'"], Some(0xDE), Some(0x0027), Some(0x27)),
        row(Backquote, &["backquote", "`"], Some(0xC0), Some(0x0060), Some(0x32)),
        row(Comma, &["comma", ","], Some(0xBC), Some(0x002C), Some(0x2B)),
        row(Period, &["period", "."], Some(0xBE), Some(0x002E), Some(0x2F)),
        row(Slash, &["slash", "/"], Some(0xBF), Some(0x002F), Some(0x2C)),
        row(CapsLock, &["capslock"], Some(0x14), Some(0xFFE5), Some(0x39)),
        row(F1, &["f1"], Some(0x70), Some(0xFFBE), Some(0x7A)),
        row(F2, &["f2"], Some(0x71), Some(0xFFBF), Some(0x78)),
        row(F3, &["f3"], Some(0x72), Some(0xFFC0), Some(0x63)),
        row(F4, &["f4"], Some(0x73), Some(0xFFC1), Some(0x76)),
        row(F5, &["f5"], Some(0x74), Some(0xFFC2), Some(0x60)),
        row(F6, &["f6"], Some(0x75), Some(0xFFC3), Some(0x61)),
        row(F7, &["f7"], Some(0x76), Some(0xFFC4), Some(0x62)),
        row(F8, &["f8"], Some(0x77), Some(0xFFC5), Some(0x64)),
        row(F9, &["f9"], Some(0x78), Some(0xFFC6), Some(0x65)),
        row(F10, &["f10"], Some(0x79), Some(0xFFC7), Some(0x6D)),
        row(F11, &["f11"], Some(0x7A), Some(0xFFC8), Some(0x67)),
        row(F12, &["f12"], Some(0x7B), Some(0xFFC9), Some(0x6F)),
        row(PrintScreen, &["printscreen"], Some(0x2C), Some(0xFF61), Some(0x69)),
        row(ScrollLock, &["scrolllock"], Some(0x91), Some(0xFF14), Some(0x6B)),
        row(Pause, &["pause"], Some(0x13), Some(0xFF13), Some(0x71)),
        row(Insert, &["insert"], Some(0x2D), Some(0xFF63), Some(0x72)),
        row(Home, &["home"], Some(0x24), Some(0xFF50), Some(0x73)),
        row(PageUp, &["pageup"], Some(0x21), Some(0xFF55), Some(0x74)),
        row(Delete, &["delete"], Some(0x2E), Some(0xFFFF), Some(0x75)),
        row(End, &["end"], Some(0x23), Some(0xFF57), Some(0x77)),
        row(PageDown, &["pagedown"], Some(0x22), Some(0xFF56), Some(0x79)),
        row(ArrowRight, &["right"], Some(0x27), Some(0xFF53), Some(0x7C)),
        row(ArrowLeft, &["left"], Some(0x25), Some(0xFF51), Some(0x7B)),
        row(ArrowDown, &["down"], Some(0x28), Some(0xFF54), Some(0x7D)),
        row(ArrowUp, &["up"], Some(0x26), Some(0xFF52), Some(0x7E)),
        row(NumLock, &["numlock"], Some(0x90), Some(0xFF7F), Some(0x47)),
        row(NumpadDivide, &["numdivide", "num/"], Some(0x6F), Some(0xFFAF), Some(0x4B)),
        row(NumpadMultiply, &["nummultiply", "num*"], Some(0x6A), Some(0xFFAA), Some(0x43)),
        row(NumpadSubtract, &["numsubtract", "num-"], Some(0x6D), Some(0xFFAD), Some(0x4E)),
        row(NumpadAdd, &["numadd", "num+"], Some(0x6B), Some(0xFFAB), Some(0x45)),
        row(NumpadEnter, &["numenter"], None, Some(0xFF8D), Some(0x4C)),
        row(Numpad1, &["num1", "kp1"], Some(0x61), Some(0xFFB1), Some(0x53)),
        row(Numpad2, &["num2", "kp2"], Some(0x62), Some(0xFFB2), Some(0x54)),
        row(Numpad3, &["num3", "kp3"], Some(0x63), Some(0xFFB3), Some(0x55)),
        row(Numpad4, &["num4", "kp4"], Some(0x64), Some(0xFFB4), Some(0x56)),
        row(Numpad5, &["num5", "kp5"], Some(0x65), Some(0xFFB5), Some(0x57)),
        row(Numpad6, &["num6", "kp6"], Some(0x66), Some(0xFFB6), Some(0x58)),
        row(Numpad7, &["num7", "kp7"], Some(0x67), Some(0xFFB7), Some(0x59)),
        row(Numpad8, &["num8", "kp8"], Some(0x68), Some(0xFFB8), Some(0x5B)),
        row(Numpad9, &["num9", "kp9"], Some(0x69), Some(0xFFB9), Some(0x5C)),
        row(Numpad0, &["num0", "kp0"], Some(0x60), Some(0xFFB0), Some(0x52)),
        row(NumpadDecimal, &["numdecimal", "num."], Some(0x6E), Some(0xFFAE), Some(0x41)),
        row(ContextMenu, &["menu"], Some(0x5D), Some(0xFF67), Some(0x6E)),
        row(ControlLeft, &["ctrl", "control"], Some(0xA2), Some(0xFFE3), Some(0x3B)),
        row(ShiftLeft, &["shift"], Some(0xA0), Some(0xFFE1), Some(0x38)),
        row(AltLeft, &["alt", "option"], Some(0xA4), Some(0xFFE9), Some(0x3A)),
        row(MetaLeft, &["meta", "command", "cmd", "super"], Some(0x5B), Some(0xFFEB), Some(0x37)),
        row(ControlRight, &["rctrl"], Some(0xA3), Some(0xFFE4), Some(0x3E)),
        row(ShiftRight, &["rshift"], Some(0xA1), Some(0xFFE2), Some(0x3C)),
        row(AltRight, &["ralt"], Some(0xA5), Some(0xFFEA), Some(0x3D)),
        row(MetaRight, &["rmeta"], Some(0x5C), Some(0xFFEC), Some(0x36)),
    ]
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_has_no_duplicate_hid_codes() {
        let mut seen = HashSet::new();
        for row in KEY_TABLE {
            assert!(seen.insert(row.hid), "{:?} appears twice", row.hid);
        }
    }

    #[test]
    fn test_table_has_no_duplicate_names() {
        let mut seen = HashSet::new();
        for row in KEY_TABLE {
            for name in row.names {
                assert!(
                    seen.insert(name.to_ascii_lowercase()),
                    "name {name:?} is used by more than one key"
                );
            }
        }
    }

    #[test]
    fn test_every_row_has_a_canonical_name() {
        for row in KEY_TABLE {
            assert!(!row.names.is_empty(), "{:?} has no name", row.hid);
        }
    }

    #[test]
    fn test_unknown_is_not_in_the_table() {
        assert!(row_for(HidKeyCode::Unknown).is_none());
    }

    #[test]
    fn test_letter_a_codes_match_platform_headers() {
        let a = row_for(HidKeyCode::KeyA).expect("KeyA row");
        assert_eq!(a.vk, Some(0x41));
        assert_eq!(a.x11, Some(0x0061));
        assert_eq!(a.cg, Some(0x00));
    }
}
