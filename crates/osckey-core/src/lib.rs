//! # osckey-core
//!
//! Shared library for the OSC key simulator containing the OSC wire codec,
//! the key binding table, and key code translation tables.
//!
//! This crate has zero dependencies on OS APIs, UI frameworks, or network
//! sockets.  The simulator binary (`osckey-sim`) wires it to a UDP socket on
//! one side and to the platform keyboard injection API on the other.
//!
//! # Architecture overview (for beginners)
//!
//! A show-control desk, a lighting console, or a patch in Max/MSP sends small
//! OSC packets over the LAN.  Each packet carries an *address* such as
//! `/key` and a list of typed arguments such as `[3]`.  The simulator looks the
//! number up in its binding table and presses the configured key on the local
//! machine, as if someone had typed it.
//!
//! - **`protocol`** – How bytes travel over the network.  OSC packets are
//!   decoded into typed [`OscMessage`] values (bundles are flattened).
//!
//! - **`domain`** – The binding table: which OSC identifier maps to which key.
//!
//! - **`keymap`** – Key names as written in the settings file, and the
//!   translation from the canonical USB HID Usage ID to the native code each
//!   platform's injection API expects (Windows VK codes, X11 KeySyms, macOS
//!   CGKeyCodes).

pub mod domain;
pub mod keymap;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `osckey_core::KeyMap` instead of `osckey_core::domain::binding::KeyMap`.
pub use domain::binding::{KeyBinding, KeyMap, KeyMapError};
pub use keymap::hid::HidKeyCode;
pub use protocol::codec::{decode_packet, encode_message, ProtocolError};
pub use protocol::messages::{OscArg, OscMessage, OscPacket};
