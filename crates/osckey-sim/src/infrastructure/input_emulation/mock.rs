//! Recording input sink for tests.
//!
//! The native sinks (`WindowsInputSink`, `XTestInputSink`, `MacosInputSink`)
//! make OS calls that need a desktop session and actually press keys on the
//! test machine.  `RecordingInputSink` replaces them with in-memory recording:
//! every press and release is pushed, in order, into a `Mutex<Vec<SinkEvent>>`
//! so assertions can inspect exactly what the engine emitted.
//!
//! # Usage in tests
//!
//! ```ignore
//! let sink = Arc::new(RecordingInputSink::new());
//! let mut dispatcher = Dispatcher::new(settings, sink.clone(), transport);
//!
//! dispatcher.run_tick();
//!
//! assert_eq!(sink.events(), vec![SinkEvent::Press(HidKeyCode::KeyA)]);
//! ```
//!
//! # Failure injection
//!
//! `set_fail(true)` makes every call return `EmulationError::Platform`, which
//! exercises the engine's error paths without a broken OS.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, PoisonError,
};

use osckey_core::keymap::hid::HidKeyCode;

use crate::application::input_sink::{EmulationError, InputSink};

/// One call observed by [`RecordingInputSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    Press(HidKeyCode),
    Release(HidKeyCode),
}

/// A sink that records calls instead of touching the OS.
#[derive(Debug, Default)]
pub struct RecordingInputSink {
    events: Mutex<Vec<SinkEvent>>,
    should_fail: AtomicBool,
}

impl RecordingInputSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail (or succeed again).
    pub fn set_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    /// All recorded calls in order.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn presses(&self) -> Vec<HidKeyCode> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Press(k) => Some(k),
                SinkEvent::Release(_) => None,
            })
            .collect()
    }

    pub fn releases(&self) -> Vec<HidKeyCode> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Release(k) => Some(k),
                SinkEvent::Press(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn record(&self, event: SinkEvent) -> Result<(), EmulationError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(EmulationError::Platform("mock failure".into()));
        }
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event);
        Ok(())
    }
}

impl InputSink for RecordingInputSink {
    fn press_key(&self, key: HidKeyCode) -> Result<(), EmulationError> {
        self.record(SinkEvent::Press(key))
    }

    fn release_key(&self, key: HidKeyCode) -> Result<(), EmulationError> {
        self.record(SinkEvent::Release(key))
    }
}
