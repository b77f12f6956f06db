//! Storage infrastructure: settings file loading.
//!
//! The `config` sub-module reads the TOML settings file from the
//! platform-appropriate directory (or the `--config` path), validates it, and
//! turns it into the engine's `EngineSettings`.

pub mod config;
