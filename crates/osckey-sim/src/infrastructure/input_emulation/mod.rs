//! Platform-specific input sink implementations.
//!
//! The native sink is selected at compile time via `#[cfg(target_os = ...)]`;
//! [`native_sink`] returns it, or the dry-run sink where none exists.

use std::sync::Arc;

use crate::application::input_sink::{EmulationError, InputSink};

pub mod dry_run;
pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(all(target_os = "linux", feature = "xtest"))]
pub mod linux;

#[cfg(target_os = "macos")]
pub mod macos;

/// Builds the input sink for this platform.
///
/// # Errors
///
/// Returns [`EmulationError`] if the native sink cannot be initialised
/// (no X display, Accessibility permission missing, ...).
pub fn native_sink() -> Result<Arc<dyn InputSink>, EmulationError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Arc::new(windows::WindowsInputSink::new()))
    }

    #[cfg(target_os = "macos")]
    {
        Ok(Arc::new(macos::MacosInputSink::new()?))
    }

    #[cfg(all(target_os = "linux", feature = "xtest"))]
    {
        Ok(Arc::new(linux::XTestInputSink::new()?))
    }

    #[cfg(not(any(
        target_os = "windows",
        target_os = "macos",
        all(target_os = "linux", feature = "xtest")
    )))]
    {
        tracing::warn!("no native input sink for this build; keystrokes are only logged");
        Ok(Arc::new(dry_run::DryRunInputSink::new()))
    }
}
