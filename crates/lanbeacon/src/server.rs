//! UDP broadcast reply server.
//!
//! A [`BroadcastServer`] binds the configured port and answers datagrams
//! that pass the configured accept filter.  On receiving a decodable
//! datagram it:
//!
//! 1. Emits [`ServerEvent::MessageReceiving`] on the event channel.
//! 2. Applies the accept filter to the decoded text.
//! 3. If accepted, sends the configured response back to the sender's
//!    address and emits [`ServerEvent::MessageReceived`].
//!
//! The receive loop runs as a blocking task on a dedicated named thread to
//! keep synchronous socket I/O off any async runtime.
//!
//! # Shutdown
//!
//! The socket is configured with a short read timeout, so `recv_from`
//! blocks for at most [`POLL_INTERVAL`] before returning a timeout error.
//! On each wakeup the loop checks the shared `running` flag; once
//! [`shutdown`](BroadcastServer::shutdown) clears it, the loop exits and
//! the thread is joined.  Stop latency is therefore bounded by the poll
//! interval, and no socket is ever closed out from under a pending receive.
//!
//! # Fault containment
//!
//! A server must survive hostile or malformed traffic indefinitely: an
//! undecodable datagram, a failed reply transmission, or any other
//! transient I/O error is logged and the loop moves on to the next
//! datagram.  Only the `running` flag ends the loop.

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::event::ServerEvent;

/// Upper bound on how long a pending receive can delay shutdown.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Error type for server startup.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The UDP socket could not be bound, typically because another server
    /// already listens on the port.
    #[error("failed to bind broadcast socket on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// The bound socket could not be configured for polled receives.
    #[error("failed to configure broadcast socket: {0}")]
    SocketSetup(#[from] std::io::Error),
}

/// A running broadcast reply server.
///
/// Dropping the handle shuts the server down; [`shutdown`] does the same
/// explicitly and may be called any number of times.
///
/// [`shutdown`]: BroadcastServer::shutdown
pub struct BroadcastServer {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl BroadcastServer {
    /// Binds `0.0.0.0:port` and spawns the background receive loop.
    ///
    /// Events are published on `events`; a full channel drops the
    /// notification rather than stalling the loop, and a dropped receiver
    /// leaves the server answering without notifications.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::BindFailed`] if the port is taken and
    /// [`ServerError::SocketSetup`] if the read timeout cannot be applied.
    pub fn start(
        config: ServerConfig,
        events: mpsc::Sender<ServerEvent>,
    ) -> Result<Self, ServerError> {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port()));
        let socket =
            UdpSocket::bind(addr).map_err(|source| ServerError::BindFailed { addr, source })?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        let local_addr = socket.local_addr()?;

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = std::thread::Builder::new()
            .name(format!("beacon-server-{}", config.port()))
            .spawn(move || serve_loop(socket, config, events, flag))
            .expect("failed to spawn server thread");

        info!("broadcast server listening on UDP {local_addr}");
        Ok(Self {
            running,
            handle: Some(handle),
            local_addr,
        })
    }

    /// The address the server's socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Signals the receive loop to exit and waits for the thread to finish.
    ///
    /// Safe to call repeatedly; later calls are no-ops.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("broadcast server thread panicked during shutdown");
            }
        }
    }
}

impl Drop for BroadcastServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The main receive loop executed on the server thread.
fn serve_loop(
    socket: UdpSocket,
    config: ServerConfig,
    events: mpsc::Sender<ServerEvent>,
    running: Arc<AtomicBool>,
) {
    let mut buf = vec![0u8; 4096];
    let response = config.response_message().as_bytes().to_vec();

    while running.load(Ordering::Relaxed) {
        let (len, src) = match socket.recv_from(&mut buf) {
            Ok(pair) => pair,
            Err(e) if is_timeout_error(&e) => continue,
            Err(e) => {
                warn!("recv error on port {}: {e}", config.port());
                continue;
            }
        };

        let message = match std::str::from_utf8(&buf[..len]) {
            Ok(text) => text.to_owned(),
            Err(e) => {
                debug!("ignoring undecodable datagram from {src}: {e}");
                continue;
            }
        };

        publish(
            &events,
            ServerEvent::MessageReceiving {
                addr: src,
                message: message.clone(),
                config: config.clone(),
            },
        );

        if !config.accepts(&message) {
            debug!("filter rejected message from {src}");
            continue;
        }

        if let Err(e) = socket.send_to(&response, src) {
            warn!("failed to send reply to {src}: {e}");
            continue;
        }
        debug!("replied to {src}");

        publish(
            &events,
            ServerEvent::MessageReceived {
                addr: src,
                message,
                config: config.clone(),
            },
        );
    }

    info!("broadcast server on port {} stopped", config.port());
}

/// Publishes an event without ever blocking the receive loop.
fn publish(events: &mpsc::Sender<ServerEvent>, event: ServerEvent) {
    match events.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!("event channel full; dropping notification");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            // No listener attached; keep answering regardless.
        }
    }
}

/// Returns `true` for OS timeout / would-block errors raised by the polled
/// receive.
fn is_timeout_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
