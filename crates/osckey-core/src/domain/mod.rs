//! Domain entities for the OSC key simulator.
//!
//! Pure data with no infrastructure dependencies: the binding table that maps
//! an OSC identifier to a keyboard key.

/// Binding table: OSC identifier → key.
///
/// See [`binding::KeyMap`] for the main type.
pub mod binding;
