//! Process signals: Ctrl-C clears the shared `running` flag.
//!
//! If the handler cannot be installed the simulator keeps running; it can
//! still be stopped by killing the process.

use std::future::Future;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::task::JoinHandle;
use tracing::{error, info};

/// Waits for `signal`, then clears `running`.
///
/// When `signal` fails, the error is logged and the future never completes,
/// so callers that select on it do not mistake the failure for a shutdown.
pub async fn stop_on_signal<F>(signal: F, running: Arc<AtomicBool>)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            info!("shutdown signal received");
            running.store(false, Ordering::Relaxed);
        }
        Err(e) => {
            error!("could not listen for Ctrl-C ({e}); running until the process is killed");
            std::future::pending::<()>().await;
        }
    }
}

/// Spawns the Ctrl-C handler.  The task completes only after a real signal.
pub fn spawn_ctrl_c_handler(running: Arc<AtomicBool>) -> JoinHandle<()> {
    tokio::spawn(stop_on_signal(tokio::signal::ctrl_c(), running))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_signal_clears_running_flag() {
        // Arrange
        let running = Arc::new(AtomicBool::new(true));

        // Act
        stop_on_signal(async { Ok(()) }, Arc::clone(&running)).await;

        // Assert
        assert!(!running.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn test_failed_handler_install_does_not_stop_the_app() {
        // Arrange
        let running = Arc::new(AtomicBool::new(true));
        let failing = async { Err(io::Error::new(io::ErrorKind::Other, "no signal support")) };

        // Act
        let waited =
            tokio::time::timeout(Duration::from_millis(100), stop_on_signal(failing, Arc::clone(&running)))
                .await;

        // Assert: still pending and the flag is untouched
        assert!(waited.is_err(), "a failed install must never complete the shutdown future");
        assert!(running.load(Ordering::Relaxed));
    }
}
