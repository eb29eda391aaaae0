//! Single-shot UDP broadcast query client.
//!
//! A [`BroadcastClient`] performs exactly one send/await-reply cycle: it
//! opens an ephemeral socket, sends the configured message to the limited
//! broadcast address on the configured port, and waits for the first
//! decodable reply.  The cycle runs on a dedicated thread so the caller
//! returns immediately; the result is delivered to the callback exactly
//! once as a [`SendOutcome`]: either [`Replied`](SendOutcome::Replied)
//! with the server's answer or [`TimedOut`](SendOutcome::TimedOut) when
//! the configured timeout elapses first.
//!
//! The deadline is enforced with a read timeout on the receiving socket
//! itself; nothing closes the socket out from under the pending receive.
//! Transient receive errors and undecodable replies are logged and waiting
//! continues until the deadline.

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ClientConfig;

/// Error type for client socket preparation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The ephemeral query socket could not be opened or configured.
    #[error("failed to open query socket: {0}")]
    Open(#[from] std::io::Error),
}

/// A reply received from a broadcast server.
#[derive(Debug, Clone)]
pub struct ServerResponse {
    message: String,
    config: ClientConfig,
    addr: SocketAddr,
}

impl ServerResponse {
    /// The message the server replied with.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The configuration the query was sent with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The address of the server that replied.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

/// Result of one send/await-reply cycle, delivered to the callback exactly
/// once.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    /// A server replied before the timeout.
    Replied(ServerResponse),
    /// No reply arrived within the configured timeout.
    TimedOut,
}

/// A single-use broadcast query client.
///
/// [`send`](BroadcastClient::send) consumes the client; a new one is
/// constructed for every query.
pub struct BroadcastClient {
    config: ClientConfig,
}

impl BroadcastClient {
    /// Creates a client for one query described by `config`.
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Broadcasts the configured message and resolves the outcome in the
    /// background.
    ///
    /// Returns as soon as the cycle thread is running; `callback` is
    /// invoked from that thread exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Open`] if the ephemeral socket cannot be
    /// opened or switched to broadcast mode.  Later failures, including a
    /// failed transmit, are contained in the cycle, which then resolves as
    /// [`SendOutcome::TimedOut`].
    pub fn send<F>(self, callback: F) -> Result<(), ClientError>
    where
        F: FnOnce(SendOutcome) + Send + 'static,
    {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.set_broadcast(true)?;

        std::thread::Builder::new()
            .name("beacon-client".to_string())
            .spawn(move || query_cycle(socket, self.config, callback))
            .expect("failed to spawn client thread");
        Ok(())
    }
}

/// One complete send/await-reply cycle, executed on the client thread.
fn query_cycle<F>(socket: UdpSocket, config: ClientConfig, callback: F)
where
    F: FnOnce(SendOutcome),
{
    let target = SocketAddr::from((Ipv4Addr::BROADCAST, config.port()));
    if let Err(e) = socket.send_to(config.message().as_bytes(), target) {
        // The cycle still resolves; with nothing sent it will time out.
        warn!("failed to send broadcast to {target}: {e}");
    }

    let deadline = Instant::now() + config.timeout();
    let mut buf = vec![0u8; 4096];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            debug!(
                "no reply within {:?} on port {}",
                config.timeout(),
                config.port()
            );
            callback(SendOutcome::TimedOut);
            return;
        }

        if let Err(e) = socket.set_read_timeout(Some(remaining)) {
            warn!("failed to arm receive timeout: {e}");
            callback(SendOutcome::TimedOut);
            return;
        }

        match socket.recv_from(&mut buf) {
            Ok((len, src)) => match std::str::from_utf8(&buf[..len]) {
                Ok(text) => {
                    debug!("reply from {src}");
                    callback(SendOutcome::Replied(ServerResponse {
                        message: text.to_owned(),
                        config,
                        addr: src,
                    }));
                    return;
                }
                Err(e) => {
                    debug!("ignoring undecodable reply from {src}: {e}");
                }
            },
            Err(e) if is_timeout_error(&e) => {
                // Woke up at the deadline; the next iteration resolves it.
            }
            Err(e) => {
                debug!("recv error while awaiting reply: {e}");
            }
        }
    }
}

/// Returns `true` for OS timeout / would-block errors raised by the
/// deadline-bounded receive.
fn is_timeout_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
