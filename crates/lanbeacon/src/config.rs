//! Validated configuration values for servers and clients.
//!
//! Both configurations are immutable once constructed and validated at
//! construction time, so a running server or an in-flight send never has to
//! re-check its inputs.  All configuration errors surface here, synchronously,
//! through [`ConfigError`]; nothing inside a receive loop ever raises one.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Predicate deciding whether an incoming message warrants a reply.
pub type MessageFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Error type for invalid configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The port was zero.
    #[error("port must be greater than zero")]
    InvalidPort,
    /// The message to send was empty or whitespace-only.
    #[error("message must not be blank")]
    BlankMessage,
    /// The response message was empty or whitespace-only.
    #[error("response message must not be blank")]
    BlankResponse,
    /// The reply timeout was zero.
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
}

/// Configuration of a broadcast reply server: which port to listen on, what
/// to answer, and which messages to answer at all.
///
/// The filter is shared behind an `Arc`, so cloning a `ServerConfig` is
/// cheap and every clone applies the same predicate.
#[derive(Clone)]
pub struct ServerConfig {
    port: u16,
    response_message: String,
    filter: MessageFilter,
}

impl ServerConfig {
    /// Validates and builds a server configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPort`] for port zero and
    /// [`ConfigError::BlankResponse`] for an empty or whitespace-only
    /// response message.
    pub fn new<F>(
        port: u16,
        response_message: impl Into<String>,
        filter: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        if port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        let response_message = response_message.into();
        if response_message.trim().is_empty() {
            return Err(ConfigError::BlankResponse);
        }
        Ok(Self {
            port,
            response_message,
            filter: Arc::new(filter),
        })
    }

    /// The UDP port the server listens on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The message sent back to an accepted sender.
    pub fn response_message(&self) -> &str {
        &self.response_message
    }

    /// Applies the accept filter to a decoded message.
    pub fn accepts(&self, message: &str) -> bool {
        (self.filter)(message)
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("port", &self.port)
            .field("response_message", &self.response_message)
            .finish_non_exhaustive()
    }
}

/// Configuration of one broadcast query: where to send, what to send, and
/// how long to wait for an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    port: u16,
    message: String,
    timeout: Duration,
}

impl ClientConfig {
    /// Validates and builds a client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPort`] for port zero,
    /// [`ConfigError::BlankMessage`] for an empty or whitespace-only message,
    /// and [`ConfigError::ZeroTimeout`] for a zero timeout.
    pub fn new(
        port: u16,
        message: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        if port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ConfigError::BlankMessage);
        }
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Self {
            port,
            message,
            timeout,
        })
    }

    /// The UDP port the query is broadcast on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The message broadcast to the network.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// How long to wait for a server reply.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
