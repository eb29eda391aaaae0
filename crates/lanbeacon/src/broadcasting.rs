//! Public entry point: a registry of running servers plus stateless sends.
//!
//! [`Broadcasting`] owns every server it starts, keyed by the opaque
//! [`ServerToken`] minted at start time.  All servers publish their
//! lifecycle events into one aggregated channel whose receiver is handed
//! out by [`Broadcasting::new`]; client sends are forwarded to a fresh
//! [`BroadcastClient`] and never retained.
//!
//! The registry is guarded by a mutex so `start` and `stop` may be called
//! from any thread.  Server threads never touch the registry, and teardown
//! (flag + join) always happens outside the lock.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::debug;

use crate::client::{BroadcastClient, ClientError, SendOutcome};
use crate::config::{ClientConfig, ServerConfig};
use crate::event::ServerEvent;
use crate::server::{BroadcastServer, ServerError};
use crate::token::ServerToken;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Manages broadcast servers on this host and sends queries to servers on
/// the network.
pub struct Broadcasting {
    servers: Mutex<HashMap<ServerToken, BroadcastServer>>,
    event_tx: mpsc::Sender<ServerEvent>,
}

impl Broadcasting {
    /// Creates the facade together with the receiver for the aggregated
    /// event stream of every server it will start.
    pub fn new() -> (Self, mpsc::Receiver<ServerEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let facade = Self {
            servers: Mutex::new(HashMap::new()),
            event_tx,
        };
        (facade, event_rx)
    }

    /// Starts a new broadcast server and registers it under a fresh token.
    ///
    /// The returned token is the only handle to the running server; pass it
    /// to [`stop`](Broadcasting::stop) to shut the server down.  Tokens are
    /// never recycled.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the configured port cannot be bound;
    /// starting two servers on one port fails the second one.
    pub fn start(&self, config: ServerConfig) -> Result<ServerToken, ServerError> {
        let server = BroadcastServer::start(config, self.event_tx.clone())?;
        let token = ServerToken::mint();
        self.servers
            .lock()
            .expect("server registry lock poisoned")
            .insert(token, server);
        Ok(token)
    }

    /// Stops the server identified by `token`.
    ///
    /// A token that is unknown (never issued, or already stopped) is
    /// silently ignored, so stopping twice is harmless.
    pub fn stop(&self, token: ServerToken) {
        let server = self
            .servers
            .lock()
            .expect("server registry lock poisoned")
            .remove(&token);
        match server {
            Some(mut server) => server.shutdown(),
            None => debug!("stop requested for unknown server token"),
        }
    }

    /// Stops every running server, emptying the registry.
    pub fn dispose_all(&self) {
        let drained: Vec<BroadcastServer> = {
            let mut registry = self
                .servers
                .lock()
                .expect("server registry lock poisoned");
            registry.drain().map(|(_, server)| server).collect()
        };
        for mut server in drained {
            server.shutdown();
        }
    }

    /// Sends one broadcast query; `callback` receives the [`SendOutcome`]
    /// exactly once.
    ///
    /// Stateless with respect to the registry: the client lives only for
    /// its single send/await-reply cycle.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the query socket cannot be prepared.
    pub fn send<F>(&self, config: ClientConfig, callback: F) -> Result<(), ClientError>
    where
        F: FnOnce(SendOutcome) + Send + 'static,
    {
        BroadcastClient::new(config).send(callback)
    }
}

impl Drop for Broadcasting {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
