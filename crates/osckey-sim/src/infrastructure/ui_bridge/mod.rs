//! Presentation bridge: a line console on stdin and a log-based renderer.
//!
//! The engine never blocks on the presentation layer.  Both directions go
//! through channels owned by `main`:
//!
//! ```text
//! stdin ──> console task ──UiCommand (mpsc)──> dispatcher tick
//! dispatcher tick ──EngineSnapshot (watch)──> renderer task / `status`
//! ```
//!
//! # Console commands
//!
//! | Line                      | Effect                                   |
//! |---------------------------|------------------------------------------|
//! | `gate on\|off\|toggle`    | manual override of the enable/disable gate |
//! | `mode toggle\|momentary`  | switch trigger mode (releases held keys) |
//! | `keys on\|off`            | allow or suppress synthetic keystrokes   |
//! | `status`                  | print the current snapshot as JSON       |
//! | `help`                    | list the commands                        |
//!
//! Every reply is a [`CommandResult`] serialized as one JSON line, so scripts
//! can drive the console through a pipe:
//! ```json
//! { "success": true,  "data": {...}, "error": null  }
//! { "success": false, "data": null,  "error": "..."  }
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info};

use crate::application::dispatch::{EngineSnapshot, UiCommand};

pub const HELP_TEXT: &str =
    "commands: gate on|off|toggle, mode toggle|momentary, keys on|off, status, help";

/// A console line that could not be understood.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognised command {0:?} (try `help`)")]
pub struct ConsoleParseError(pub String);

/// One parsed console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleRequest {
    Command(UiCommand),
    Status,
    Help,
}

impl FromStr for ConsoleRequest {
    type Err = ConsoleParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<String> = line.split_whitespace().map(str::to_ascii_lowercase).collect();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();
        let request = match words.as_slice() {
            ["gate", "on"] => Self::Command(UiCommand::SetGate(true)),
            ["gate", "off"] => Self::Command(UiCommand::SetGate(false)),
            ["gate", "toggle"] | ["gate"] => Self::Command(UiCommand::ToggleGate),
            ["mode", "toggle"] => Self::Command(UiCommand::SetToggleMode(true)),
            ["mode", "momentary"] => Self::Command(UiCommand::SetToggleMode(false)),
            ["mode"] => Self::Command(UiCommand::ToggleMode),
            ["keys", "on"] => Self::Command(UiCommand::SetKeystrokesAllowed(true)),
            ["keys", "off"] => Self::Command(UiCommand::SetKeystrokesAllowed(false)),
            ["status"] => Self::Status,
            ["help"] | ["?"] => Self::Help,
            _ => return Err(ConsoleParseError(line.trim().to_string())),
        };
        Ok(request)
    }
}

/// Unified reply envelope printed by the console.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    /// `true` if the command was accepted.
    pub success: bool,
    /// The reply payload, present only when `success` is `true`.
    pub data: Option<T>,
    /// A human-readable error message, present only when `success` is `false`.
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(msg.into()) }
    }
}

impl<T: Serialize> CommandResult<T> {
    /// Serializes the reply as one JSON line.
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"success":false,"data":null,"error":"{e}"}}"#))
    }
}

/// Handles one console line and returns the JSON reply.
///
/// Accepted commands are forwarded to the dispatcher; `status` reads the
/// latest snapshot.
pub fn handle_console_line(
    line: &str,
    commands: &mpsc::UnboundedSender<UiCommand>,
    snapshots: &watch::Receiver<EngineSnapshot>,
) -> String {
    match line.parse::<ConsoleRequest>() {
        Ok(ConsoleRequest::Command(cmd)) => match commands.send(cmd) {
            Ok(()) => CommandResult::ok(format!("{cmd:?}")).to_json_line(),
            Err(_) => CommandResult::<()>::err("engine is shutting down").to_json_line(),
        },
        Ok(ConsoleRequest::Status) => CommandResult::ok(snapshots.borrow().clone()).to_json_line(),
        Ok(ConsoleRequest::Help) => CommandResult::ok(HELP_TEXT).to_json_line(),
        Err(e) => CommandResult::<()>::err(e.to_string()).to_json_line(),
    }
}

/// Spawns the stdin console.  The task ends at end of input or when the
/// dispatcher drops its command receiver.
pub fn spawn_console(
    commands: mpsc::UnboundedSender<UiCommand>,
    snapshots: watch::Receiver<EngineSnapshot>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        info!("console ready; {HELP_TEXT}");
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => {
                    println!("{}", handle_console_line(&line, &commands, &snapshots));
                    if commands.is_closed() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    debug!("console read error: {e}");
                    break;
                }
            }
        }
        debug!("console closed");
    })
}

/// Human-readable transitions between two snapshots.
///
/// The renderer logs these instead of drawing: the indicator coming up or
/// going down, the label of a newly received identifier, and flag changes.
pub fn describe_transition(prev: &EngineSnapshot, next: &EngineSnapshot) -> Vec<String> {
    let mut lines = Vec::new();
    if next.receiving && (!prev.receiving || prev.last_message_id != next.last_message_id) {
        let label = next.last_label.as_deref().unwrap_or("?");
        lines.push(format!("receiving: keystroke {label}"));
    } else if next.receiving && next.fade_alpha > prev.fade_alpha {
        // Same identifier again: the window restarted.
        let label = next.last_label.as_deref().unwrap_or("?");
        lines.push(format!("receiving: keystroke {label} (repeat)"));
    }
    if prev.receiving && !next.receiving {
        lines.push("idle".to_string());
    }
    if prev.gate_enabled != next.gate_enabled {
        lines.push(format!("gate {}", if next.gate_enabled { "enabled" } else { "disabled" }));
    }
    if prev.toggle_mode != next.toggle_mode {
        lines.push(format!("mode {}", if next.toggle_mode { "toggle" } else { "momentary" }));
    }
    if prev.keystrokes_allowed != next.keystrokes_allowed {
        lines.push(format!(
            "keystrokes {}",
            if next.keystrokes_allowed { "allowed" } else { "suppressed" }
        ));
    }
    if prev.held_keys != next.held_keys {
        lines.push(format!("held: [{}]", next.held_keys.join(", ")));
    }
    lines
}

/// Spawns the renderer.  The task ends when the snapshot sender is dropped.
pub fn spawn_renderer(mut snapshots: watch::Receiver<EngineSnapshot>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut prev = snapshots.borrow_and_update().clone();
        while snapshots.changed().await.is_ok() {
            let next = snapshots.borrow_and_update().clone();
            for line in describe_transition(&prev, &next) {
                info!(target: "osckey::feedback", "{line}");
            }
            prev = next;
        }
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_console_commands() {
        assert_eq!("gate on".parse::<ConsoleRequest>(), Ok(ConsoleRequest::Command(UiCommand::SetGate(true))));
        assert_eq!("  GATE   off ".parse::<ConsoleRequest>(), Ok(ConsoleRequest::Command(UiCommand::SetGate(false))));
        assert_eq!("gate toggle".parse::<ConsoleRequest>(), Ok(ConsoleRequest::Command(UiCommand::ToggleGate)));
        assert_eq!(
            "mode momentary".parse::<ConsoleRequest>(),
            Ok(ConsoleRequest::Command(UiCommand::SetToggleMode(false)))
        );
        assert_eq!(
            "keys off".parse::<ConsoleRequest>(),
            Ok(ConsoleRequest::Command(UiCommand::SetKeystrokesAllowed(false)))
        );
        assert_eq!("status".parse::<ConsoleRequest>(), Ok(ConsoleRequest::Status));
    }

    #[test]
    fn test_parse_rejects_unknown_lines() {
        let err = "launch missiles".parse::<ConsoleRequest>().unwrap_err();
        assert_eq!(err, ConsoleParseError("launch missiles".to_string()));
    }

    #[test]
    fn test_command_result_envelope_shape() {
        // Arrange / Act
        let ok: serde_json::Value = serde_json::from_str(&CommandResult::ok(1).to_json_line()).unwrap();
        let err: serde_json::Value =
            serde_json::from_str(&CommandResult::<()>::err("boom").to_json_line()).unwrap();

        // Assert
        assert_eq!(ok["success"], true);
        assert_eq!(ok["data"], 1);
        assert!(ok["error"].is_null());
        assert_eq!(err["success"], false);
        assert_eq!(err["error"], "boom");
    }

    #[test]
    fn test_handle_console_line_forwards_commands() {
        // Arrange
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_snap_tx, snap_rx) = watch::channel(EngineSnapshot::default());

        // Act
        let reply = handle_console_line("mode toggle", &tx, &snap_rx);

        // Assert
        assert!(reply.contains(r#""success":true"#));
        assert_eq!(rx.try_recv().ok(), Some(UiCommand::SetToggleMode(true)));
    }

    #[test]
    fn test_status_prints_snapshot_json() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let snapshot = EngineSnapshot { gate_enabled: true, last_message_id: Some(3), ..Default::default() };
        let (_snap_tx, snap_rx) = watch::channel(snapshot);

        let reply: serde_json::Value =
            serde_json::from_str(&handle_console_line("status", &tx, &snap_rx)).unwrap();

        assert_eq!(reply["data"]["gate_enabled"], true);
        assert_eq!(reply["data"]["last_message_id"], 3);
    }

    #[test]
    fn test_describe_transition_reports_receiving_and_idle() {
        // Arrange
        let idle = EngineSnapshot::default();
        let receiving = EngineSnapshot {
            receiving: true,
            last_message_id: Some(3),
            last_label: Some("a".to_string()),
            fade_alpha: 255,
            ..Default::default()
        };

        // Act / Assert
        assert_eq!(describe_transition(&idle, &receiving), vec!["receiving: keystroke a"]);
        assert_eq!(describe_transition(&receiving, &idle), vec!["idle"]);
        let fading = EngineSnapshot { fade_alpha: 200, ..receiving.clone() };
        assert!(describe_transition(&receiving, &fading).is_empty());
    }

    #[test]
    fn test_describe_transition_reports_flag_changes() {
        let a = EngineSnapshot { gate_enabled: true, ..Default::default() };
        let b = EngineSnapshot { gate_enabled: false, toggle_mode: true, ..Default::default() };
        assert_eq!(describe_transition(&a, &b), vec!["gate disabled", "mode toggle"]);
    }
}
