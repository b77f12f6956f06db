//! Network infrastructure: the OSC-over-UDP receiver.
//!
//! Architecture:
//! - `start_osc_receiver` binds a `tokio::net::UdpSocket` and spawns a task
//!   that decodes each datagram into OSC messages (bundles are flattened) and
//!   forwards them on an unbounded `mpsc` channel.
//! - [`ChannelTransport`] wraps the receiving end and implements the
//!   dispatcher's non-blocking [`MessageTransport`] port.
//!
//! # Why an unbounded channel?
//!
//! The dispatcher drains the queue completely on every tick, so the queue
//! never holds more than one tick's worth of datagrams.  The receive task must
//! never stall waiting for the dispatcher, or the kernel socket buffer would
//! start dropping packets instead.
//!
//! # Malformed datagrams
//!
//! OSC is sent by arbitrary third-party software.  A datagram that fails to
//! decode is logged at `warn!` and dropped; it never stops the receiver.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use osckey_core::{decode_packet, OscMessage};
use thiserror::Error;
use tokio::{net::UdpSocket, sync::mpsc, task::JoinHandle, time};
use tracing::{debug, error, info, warn};

use crate::application::dispatch::MessageTransport;

/// Largest datagram accepted.  Bigger datagrams are truncated by the OS and
/// then fail to decode.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// How often the receive task re-checks the `running` flag while idle.
const SHUTDOWN_POLL: Duration = Duration::from_millis(250);

/// Errors that can occur in the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The bind address could not be parsed.
    #[error("invalid bind address {0:?}")]
    InvalidAddress(String),

    /// The UDP socket could not be bound.
    #[error("failed to bind OSC socket on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Where the receiver listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OscListenConfig {
    pub bind_address: String,
    pub port: u16,
}

impl OscListenConfig {
    /// Parses `bind_address:port`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidAddress`] if the address is not an IP.
    pub fn socket_addr(&self) -> Result<SocketAddr, TransportError> {
        let ip = self
            .bind_address
            .parse()
            .map_err(|_| TransportError::InvalidAddress(self.bind_address.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// A running OSC receiver.
pub struct OscReceiver {
    /// Address the socket is actually bound to (port resolved if 0 was asked).
    pub local_addr: SocketAddr,
    pub messages: mpsc::UnboundedReceiver<OscMessage>,
    pub task: JoinHandle<()>,
}

/// Binds the OSC socket and spawns the receive task.
///
/// The task stops when `running` is cleared or the message receiver is
/// dropped.
///
/// # Errors
///
/// Returns [`TransportError`] if the address is invalid or cannot be bound.
pub async fn start_osc_receiver(
    config: &OscListenConfig,
    running: Arc<AtomicBool>,
) -> Result<OscReceiver, TransportError> {
    let addr = config.socket_addr()?;
    let socket = UdpSocket::bind(addr)
        .await
        .map_err(|source| TransportError::BindFailed { addr, source })?;
    let local_addr = socket
        .local_addr()
        .map_err(|source| TransportError::BindFailed { addr, source })?;

    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(receive_loop(socket, tx, running));

    info!("listening for OSC on UDP {local_addr}");
    Ok(OscReceiver { local_addr, messages: rx, task })
}

async fn receive_loop(
    socket: UdpSocket,
    tx: mpsc::UnboundedSender<OscMessage>,
    running: Arc<AtomicBool>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    while running.load(Ordering::Relaxed) {
        let (len, src) = match time::timeout(SHUTDOWN_POLL, socket.recv_from(&mut buf)).await {
            Err(_elapsed) => continue,
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                error!("OSC recv error: {e}");
                continue;
            }
        };

        match decode_packet(&buf[..len]) {
            Ok(packet) => {
                for msg in packet.into_messages() {
                    debug!(%src, address = %msg.address, args = ?msg.args, "OSC message");
                    if tx.send(msg).is_err() {
                        // Dispatcher dropped: the application is shutting down.
                        info!("OSC receiver stopped (dispatcher gone)");
                        return;
                    }
                }
            }
            Err(e) => warn!("dropping malformed OSC datagram from {src} ({len} bytes): {e}"),
        }
    }

    info!("OSC receiver stopped");
}

/// [`MessageTransport`] over the receiver's channel.
#[derive(Debug)]
pub struct ChannelTransport {
    rx: mpsc::UnboundedReceiver<OscMessage>,
}

impl ChannelTransport {
    pub fn new(rx: mpsc::UnboundedReceiver<OscMessage>) -> Self {
        Self { rx }
    }

    /// Creates a transport plus the sender that feeds it.
    pub fn pair() -> (mpsc::UnboundedSender<OscMessage>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx))
    }
}

impl MessageTransport for ChannelTransport {
    fn has_pending(&self) -> bool {
        !self.rx.is_empty()
    }

    fn receive(&mut self) -> Option<OscMessage> {
        self.rx.try_recv().ok()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
