//! TOML-based settings for the simulator.
//!
//! The settings file lives in the platform-appropriate config directory unless
//! `--config` names another path:
//! - Windows:  `%APPDATA%\OscKey\settings.toml`
//! - Linux:    `~/.config/osckey/settings.toml`
//! - macOS:    `~/Library/Application Support/OscKey/settings.toml`
//!
//! Example:
//!
//! ```toml
//! [osc]
//! port = 12345
//! address = "/key"
//!
//! [keys]
//! duration_ms = 100
//! toggle_mode = false
//!
//! [[bindings]]
//! osc_id = 1
//! key = "a"
//!
//! [[bindings]]
//! osc_id = 2
//! key = "space"
//! ```
//!
//! # Serde default values
//!
//! Every field except the bindings has a `#[serde(default = "...")]` helper,
//! so a file containing only `[[bindings]]` tables is valid.  Loading never
//! falls back to a default file: without bindings the simulator has nothing to
//! do, so a missing file is an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use osckey_core::{keymap::hid::HidKeyCode, KeyBinding, KeyMap, KeyMapError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::dispatch::{ControlAddresses, EngineSettings};
use crate::application::timer::{DEFAULT_FEEDBACK_WINDOW_TICKS, DEFAULT_HOLD_DURATION};
use crate::infrastructure::network::OscListenConfig;

/// Error type for settings loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A binding names a key that does not exist.
    #[error("binding for osc_id {osc_id} names unknown key {key:?}")]
    UnknownKey { osc_id: i32, key: String },

    /// Two bindings share an identifier.
    #[error("osc_id {0} is bound more than once")]
    DuplicateMessageId(i32),

    /// An OSC address is empty or does not start with '/'.
    #[error("OSC address for {field} must start with '/', got {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    /// Two of the trigger/enable/disable addresses are equal.
    #[error("OSC addresses must differ: {0:?} is used twice")]
    ConflictingAddresses(String),

    /// A tick-based setting is zero.
    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    /// The settings define no bindings.
    #[error("no [[bindings]] defined")]
    NoBindings,
}

// ── Settings schema types ─────────────────────────────────────────────────────

/// Top-level settings file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub osc: OscConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub bindings: Vec<BindingEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Where to listen and which addresses mean what.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OscConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// IP address to bind.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Trigger address; the first argument is the `osc_id`.
    #[serde(default = "default_root_address")]
    pub address: String,
    #[serde(default = "default_enable_address")]
    pub enable: String,
    #[serde(default = "default_disable_address")]
    pub disable: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeysConfig {
    /// Hold duration of a momentary press.
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
    #[serde(default)]
    pub toggle_mode: bool,
    /// Initial state of the enable/disable gate.
    #[serde(default = "default_true")]
    pub gate_enabled: bool,
    /// Initial state of the "allow synthetic keystrokes" switch.
    #[serde(default = "default_true")]
    pub allow_keystrokes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackConfig {
    /// Ticks the "receiving" indicator stays up after a message.
    #[serde(default = "default_window_ticks")]
    pub window_ticks: u32,
    /// Dispatcher tick period.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// One `[[bindings]]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BindingEntry {
    pub osc_id: i32,
    /// Key name, e.g. `"a"`, `"space"`, `"f5"`, `"up"`.
    pub key: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_port() -> u16 {
    12345
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_root_address() -> String {
    "/key".to_string()
}
fn default_enable_address() -> String {
    "/enable".to_string()
}
fn default_disable_address() -> String {
    "/disable".to_string()
}
fn default_duration_ms() -> u64 {
    DEFAULT_HOLD_DURATION.as_millis() as u64
}
fn default_true() -> bool {
    true
}
fn default_window_ticks() -> u32 {
    DEFAULT_FEEDBACK_WINDOW_TICKS
}
fn default_tick_interval_ms() -> u64 {
    16
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { log_level: default_log_level() }
    }
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            address: default_root_address(),
            enable: default_enable_address(),
            disable: default_disable_address(),
        }
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_duration_ms(),
            toggle_mode: false,
            gate_enabled: default_true(),
            allow_keystrokes: default_true(),
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            window_ticks: default_window_ticks(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

// ── Validation ────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Parses settings from TOML text without validating them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the TOML is malformed.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Builds the binding table, resolving key names.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoBindings`], [`ConfigError::UnknownKey`] or
    /// [`ConfigError::DuplicateMessageId`].
    pub fn key_map(&self) -> Result<KeyMap, ConfigError> {
        if self.bindings.is_empty() {
            return Err(ConfigError::NoBindings);
        }
        let bindings = self
            .bindings
            .iter()
            .map(|entry| {
                let key_code = HidKeyCode::from_name(&entry.key).ok_or_else(|| ConfigError::UnknownKey {
                    osc_id: entry.osc_id,
                    key: entry.key.clone(),
                })?;
                Ok(KeyBinding::new(entry.osc_id, key_code, entry.key.clone()))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        KeyMap::from_bindings(bindings).map_err(|e| match e {
            KeyMapError::DuplicateMessageId { message_id, .. } => ConfigError::DuplicateMessageId(message_id),
            KeyMapError::UnknownKey(osc_id) | KeyMapError::NotFound(osc_id) => ConfigError::UnknownKey {
                osc_id,
                key: self
                    .bindings
                    .iter()
                    .find(|b| b.osc_id == osc_id)
                    .map(|b| b.key.clone())
                    .unwrap_or_default(),
            },
        })
    }

    /// Checks the three OSC addresses are well-formed and distinct.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAddress`] or
    /// [`ConfigError::ConflictingAddresses`].
    pub fn control_addresses(&self) -> Result<ControlAddresses, ConfigError> {
        let fields = [
            ("osc.address", &self.osc.address),
            ("osc.enable", &self.osc.enable),
            ("osc.disable", &self.osc.disable),
        ];
        for (field, value) in fields {
            if !value.starts_with('/') {
                return Err(ConfigError::InvalidAddress { field, value: value.clone() });
            }
        }
        for (i, (_, a)) in fields.iter().enumerate() {
            if fields[i + 1..].iter().any(|(_, b)| a == b) {
                return Err(ConfigError::ConflictingAddresses((*a).clone()));
            }
        }
        Ok(ControlAddresses {
            root: self.osc.address.clone(),
            enable: self.osc.enable.clone(),
            disable: self.osc.disable.clone(),
        })
    }

    /// Validates the whole file and produces the engine parameters.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn engine_settings(&self) -> Result<EngineSettings, ConfigError> {
        if self.feedback.window_ticks == 0 {
            return Err(ConfigError::ZeroValue("feedback.window_ticks"));
        }
        if self.feedback.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroValue("feedback.tick_interval_ms"));
        }
        Ok(EngineSettings {
            key_map: self.key_map()?,
            addresses: self.control_addresses()?,
            hold_duration: Duration::from_millis(self.keys.duration_ms),
            feedback_window_ticks: self.feedback.window_ticks,
            toggle_mode: self.keys.toggle_mode,
            gate_enabled: self.keys.gate_enabled,
            keystrokes_allowed: self.keys.allow_keystrokes,
        })
    }

    pub fn listen_config(&self) -> OscListenConfig {
        OscListenConfig {
            bind_address: self.osc.bind_address.clone(),
            port: self.osc.port,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.feedback.tick_interval_ms)
    }
}

// ── Settings file location ────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the settings file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default settings file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("settings.toml"))
}

/// Loads settings from `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read (including when it
/// does not exist) and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    AppConfig::from_toml_str(&content)
}

/// Resolves the platform config base directory plus the `OscKey` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("OscKey"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("osckey"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("OscKey"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
