//! Key bindings and the identifier → binding lookup table.
//!
//! A [`KeyBinding`] ties one OSC identifier (the integer carried as the first
//! argument of a trigger message) to one keyboard key.  The [`KeyMap`] is built
//! once from the settings file and never mutated afterwards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::keymap::hid::HidKeyCode;

/// Errors produced while building or querying a [`KeyMap`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyMapError {
    /// No binding exists for the identifier.  Callers treat this as a no-op.
    #[error("no key bound to message id {0}")]
    NotFound(i32),

    /// Two bindings share the same identifier.
    #[error("message id {message_id} is bound to both {first:?} and {second:?}")]
    DuplicateMessageId {
        message_id: i32,
        first: String,
        second: String,
    },

    /// A binding names a key that has no HID code.
    #[error("message id {0} is bound to an unknown key")]
    UnknownKey(i32),
}

/// One configured key: which identifier triggers it and which key it presses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    /// OSC identifier carried as the first argument of a trigger message.
    pub message_id: i32,
    /// Key pressed when the identifier arrives.
    pub key_code: HidKeyCode,
    /// Key name as written in the settings file, shown by the renderer.
    pub label: String,
}

impl KeyBinding {
    pub fn new(message_id: i32, key_code: HidKeyCode, label: impl Into<String>) -> Self {
        Self { message_id, key_code, label: label.into() }
    }
}

/// Immutable identifier → binding table with O(1) lookup.
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    by_id: HashMap<i32, KeyBinding>,
}

impl KeyMap {
    /// Builds the table, rejecting duplicate identifiers and unknown keys.
    ///
    /// # Errors
    ///
    /// Returns [`KeyMapError::DuplicateMessageId`] when two bindings share an
    /// identifier and [`KeyMapError::UnknownKey`] when a binding carries
    /// [`HidKeyCode::Unknown`].
    pub fn from_bindings(bindings: impl IntoIterator<Item = KeyBinding>) -> Result<Self, KeyMapError> {
        let mut by_id: HashMap<i32, KeyBinding> = HashMap::new();
        for binding in bindings {
            if binding.key_code == HidKeyCode::Unknown {
                return Err(KeyMapError::UnknownKey(binding.message_id));
            }
            if let Some(existing) = by_id.get(&binding.message_id) {
                return Err(KeyMapError::DuplicateMessageId {
                    message_id: binding.message_id,
                    first: existing.label.clone(),
                    second: binding.label,
                });
            }
            by_id.insert(binding.message_id, binding);
        }
        debug!(bindings = by_id.len(), "key map built");
        Ok(Self { by_id })
    }

    /// Looks up the binding for `message_id`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyMapError::NotFound`] when nothing is bound to the identifier.
    pub fn resolve(&self, message_id: i32) -> Result<&KeyBinding, KeyMapError> {
        self.by_id.get(&message_id).ok_or(KeyMapError::NotFound(message_id))
    }

    /// Number of bindings in the table.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterates the bindings ordered by identifier.
    pub fn bindings(&self) -> impl Iterator<Item = &KeyBinding> {
        let mut all: Vec<&KeyBinding> = self.by_id.values().collect();
        all.sort_by_key(|b| b.message_id);
        all.into_iter()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
