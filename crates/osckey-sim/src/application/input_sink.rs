//! The keyboard output port of the engine.
//!
//! The trigger engine never talks to the OS directly.  It calls an
//! [`InputSink`] trait object, and the infrastructure layer supplies the
//! platform implementation (`SendInput` on Windows, XTest on Linux,
//! CoreGraphics on macOS) or the dry-run/recording sinks.

use osckey_core::keymap::hid::HidKeyCode;
use thiserror::Error;

/// Error type for key injection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmulationError {
    #[error("platform error: {0}")]
    Platform(String),
    #[error("key {0:?} has no native code on this platform")]
    InvalidKeyCode(HidKeyCode),
    #[error("input sink not initialized: {0}")]
    NotInitialized(String),
}

/// Synchronous key press/release primitive.
///
/// Calls are expected to return quickly; the dispatcher invokes them from its
/// tick and never retries a failed call.
#[cfg_attr(test, mockall::automock)]
pub trait InputSink: Send + Sync {
    /// Emits a key-down event for `key`.
    fn press_key(&self, key: HidKeyCode) -> Result<(), EmulationError>;

    /// Emits a key-up event for `key`.
    fn release_key(&self, key: HidKeyCode) -> Result<(), EmulationError>;
}
