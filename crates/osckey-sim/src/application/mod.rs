//! Application layer: the OSC → key engine.
//!
//! # What lives here?
//!
//! - **`input_sink`** – The `InputSink` trait the engine presses keys
//!   through.  Platform implementations live in the infrastructure layer and
//!   are injected at construction time.
//!
//! - **`gate`** – The enable/disable gate for synthetic keystrokes.
//!
//! - **`trigger`** – The momentary/toggle press/release state machine.
//!
//! - **`timer`** – Momentary auto-release and the feedback fade, evaluated
//!   once per tick.
//!
//! - **`dispatch`** – The `Dispatcher` that drains inbound OSC messages each
//!   tick and drives everything above.

pub mod dispatch;
pub mod gate;
pub mod input_sink;
pub mod timer;
pub mod trigger;
