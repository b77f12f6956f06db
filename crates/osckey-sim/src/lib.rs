//! osckey-sim library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does osckey-sim do? (for beginners)
//!
//! Show-control software (a lighting desk, QLab, a Max/MSP patch, TouchOSC on
//! a tablet) sends small OSC messages over the LAN.  The simulator listens on
//! a UDP port and, for every message on the trigger address, looks up the
//! identifier in its binding table and presses the configured key on the
//! local machine, as if someone had typed it.
//!
//! 1. Loads `settings.toml` and builds the binding table.
//! 2. Binds a UDP socket and decodes OSC datagrams onto a channel.
//! 3. Runs the dispatcher on a fixed tick: drain messages, apply the
//!    enable/disable gate, press/release keys (momentary or toggle mode),
//!    auto-release momentary keys, fade the "receiving" indicator.
//! 4. Calls the platform injection API (`SendInput` on Windows, XTest on
//!    Linux, CoreGraphics on macOS) through the `InputSink` trait.

/// Application layer: the dispatch engine.
pub mod application;

/// Infrastructure layer: OS adapters, network, settings, and UI bridge.
pub mod infrastructure;
