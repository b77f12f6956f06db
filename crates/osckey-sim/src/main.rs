//! OSC key simulator entry point.
//!
//! Wires together the settings file, the UDP OSC receiver, the platform input
//! sink, the console, and the renderer, then runs the dispatcher tick loop on
//! the Tokio runtime.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()             -- settings.toml → EngineSettings
//!  └─ start_osc_receiver()      -- UDP socket → mpsc<OscMessage>
//!  └─ spawn_console()           -- stdin → mpsc<UiCommand>
//!  └─ spawn_renderer()          -- watch<EngineSnapshot> → log lines
//!  └─ tick loop
//!       ├─ interval tick  -> Dispatcher::run_tick, publish snapshot
//!       ├─ UiCommand      -> Dispatcher::queue_command
//!       └─ Ctrl-C         -> release_all, exit
//! ```
//!
//! # Tick loop (for beginners)
//!
//! `tokio::time::interval` fires every `tick_interval_ms`.  If the process is
//! descheduled and ticks are missed, `MissedTickBehavior::Skip` drops them
//! instead of firing a burst: timers are re-evaluated against the clock on the
//! next tick anyway, so nothing is lost by skipping.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tokio::{
    sync::{mpsc, watch},
    time::{self, MissedTickBehavior},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use osckey_sim::application::{dispatch::Dispatcher, input_sink::InputSink};
use osckey_sim::infrastructure::{
    input_emulation::{dry_run::DryRunInputSink, native_sink},
    network::{start_osc_receiver, ChannelTransport},
    signal::spawn_ctrl_c_handler,
    storage::config::{config_file_path, load_config},
    ui_bridge::{spawn_console, spawn_renderer},
};

/// Presses keys on this machine when OSC messages arrive over UDP.
#[derive(Debug, Parser)]
#[command(name = "osckey-sim", version, about)]
struct Cli {
    /// Settings file (defaults to the platform config directory).
    #[arg(short, long, env = "OSCKEY_CONFIG")]
    config: Option<PathBuf>,

    /// UDP port override.
    #[arg(short, long)]
    port: Option<u16>,

    /// Log key presses instead of injecting them.
    #[arg(long)]
    dry_run: bool,

    /// Do not read console commands from stdin.
    #[arg(long)]
    no_console: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Settings ──────────────────────────────────────────────────────────────
    let config_path = match cli.config {
        Some(path) => path,
        None => config_file_path().context("no --config given and no platform config directory")?,
    };
    let mut config = load_config(&config_path)
        .with_context(|| format!("loading settings from {}", config_path.display()))?;
    if let Some(port) = cli.port {
        config.osc.port = port;
    }

    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.general.log_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("OSC key simulator starting (settings: {})", config_path.display());

    let settings = config.engine_settings().context("invalid settings")?;
    info!(
        bindings = settings.key_map.len(),
        address = %settings.addresses.root,
        toggle_mode = settings.toggle_mode,
        "engine configured"
    );

    // ── Input sink ────────────────────────────────────────────────────────────
    let sink: Arc<dyn InputSink> = if cli.dry_run {
        Arc::new(DryRunInputSink::new())
    } else {
        match native_sink() {
            Ok(sink) => sink,
            Err(e) => {
                warn!("native input sink unavailable ({e}); falling back to dry-run");
                Arc::new(DryRunInputSink::new())
            }
        }
    };

    // Shutdown flag.
    let running = Arc::new(AtomicBool::new(true));

    // ── OSC receiver ──────────────────────────────────────────────────────────
    let receiver = start_osc_receiver(&config.listen_config(), Arc::clone(&running))
        .await
        .context("starting OSC receiver")?;

    let mut dispatcher = Dispatcher::new(settings, sink, ChannelTransport::new(receiver.messages));

    // ── Presentation ──────────────────────────────────────────────────────────
    let (snapshot_tx, snapshot_rx) = watch::channel(dispatcher.snapshot());
    let (command_tx, mut command_rx) = mpsc::unbounded_channel();
    let renderer = spawn_renderer(snapshot_rx.clone());
    if cli.no_console {
        drop(command_tx);
    } else {
        spawn_console(command_tx, snapshot_rx);
    }

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let mut shutdown = spawn_ctrl_c_handler(Arc::clone(&running));

    // ── Tick loop ─────────────────────────────────────────────────────────────
    let mut ticker = time::interval(config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut console_open = !cli.no_console;

    info!("OSC key simulator ready on UDP {}", receiver.local_addr);

    while running.load(Ordering::Relaxed) {
        tokio::select! {
            _ = ticker.tick() => {
                dispatcher.run_tick();
                let snapshot = dispatcher.snapshot();
                snapshot_tx.send_if_modified(|current| {
                    if *current == snapshot {
                        false
                    } else {
                        *current = snapshot;
                        true
                    }
                });
            }
            cmd = command_rx.recv(), if console_open => match cmd {
                Some(cmd) => dispatcher.queue_command(cmd),
                None => console_open = false,
            },
            _ = &mut shutdown => break,
        }
    }

    // ── Shutdown ──────────────────────────────────────────────────────────────
    running.store(false, Ordering::Relaxed);
    let released = dispatcher.release_all();
    if !released.is_empty() {
        info!(count = released.len(), "released held keys on shutdown");
    }
    drop(snapshot_tx);
    if let Err(e) = renderer.await {
        warn!("renderer task ended abnormally: {e}");
    }
    receiver.task.abort();
    shutdown.abort();

    info!("OSC key simulator stopped");
    Ok(())
}
