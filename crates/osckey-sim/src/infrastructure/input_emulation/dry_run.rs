//! Input sink that only logs.
//!
//! Used with `--dry-run`, and as the fallback on platforms (or Linux builds
//! without the `xtest` feature) that have no native sink.

use osckey_core::keymap::hid::HidKeyCode;
use tracing::info;

use crate::application::input_sink::{EmulationError, InputSink};

#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunInputSink;

impl DryRunInputSink {
    pub fn new() -> Self {
        Self
    }
}

impl InputSink for DryRunInputSink {
    fn press_key(&self, key: HidKeyCode) -> Result<(), EmulationError> {
        info!(key = %key, hid = key.as_u16(), "[dry-run] press");
        Ok(())
    }

    fn release_key(&self, key: HidKeyCode) -> Result<(), EmulationError> {
        info!(key = %key, hid = key.as_u16(), "[dry-run] release");
        Ok(())
    }
}
