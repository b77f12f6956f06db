//! Infrastructure layer for the simulator.
//!
//! Contains OS-facing adapters: key injection APIs, the UDP OSC receiver, the
//! settings file, and the console/renderer bridge.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `osckey_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`input_emulation`** – OS-specific implementations of `InputSink`.  The
//!   correct implementation is selected at compile time using
//!   `#[cfg(target_os)]`.  Dry-run and recording sinks are also provided.
//!
//! - **`network`** – UDP socket that decodes OSC datagrams onto a channel, and
//!   the `ChannelTransport` the dispatcher drains.
//!
//! - **`signal`** – The Ctrl-C handler that clears the shared `running` flag.
//!
//! - **`storage`** – TOML settings loading and validation.
//!
//! - **`ui_bridge`** – The stdin console and the snapshot renderer.

pub mod input_emulation;
pub mod network;
pub mod signal;
pub mod storage;
pub mod ui_bridge;
