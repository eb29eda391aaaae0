//! Demo broadcast reply server.
//!
//! Loads `lanbeacon-server.toml` from the working directory (defaults are
//! used when the file is absent), starts one broadcast server that answers
//! `accept_message` with `response_message`, logs both lifecycle events,
//! and shuts down on Ctrl-C.
//!
//! ```toml
//! # lanbeacon-server.toml
//! port = 37455
//! response_message = "Hello Client"
//! accept_message = "Hello Server"
//! ```

use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lanbeacon::{Broadcasting, ServerConfig, ServerEvent};

const CONFIG_FILE: &str = "lanbeacon-server.toml";

/// On-disk demo configuration; every field falls back to the classic
/// greeting exchange.
#[derive(Debug, Deserialize, PartialEq)]
struct DemoConfig {
    /// The UDP port to listen on.
    #[serde(default = "default_port")]
    port: u16,
    /// The message sent back to accepted senders.
    #[serde(default = "default_response_message")]
    response_message: String,
    /// The only message the server answers.
    #[serde(default = "default_accept_message")]
    accept_message: String,
}

fn default_port() -> u16 {
    37455
}
fn default_response_message() -> String {
    "Hello Client".to_string()
}
fn default_accept_message() -> String {
    "Hello Server".to_string()
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            response_message: default_response_message(),
            accept_message: default_accept_message(),
        }
    }
}

/// Loads the demo configuration, returning defaults if no file exists.
fn load_config() -> anyhow::Result<DemoConfig> {
    match std::fs::read_to_string(CONFIG_FILE) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DemoConfig::default()),
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = load_config()?;
    info!(
        "answering '{}' with '{}' on UDP {}",
        cfg.accept_message, cfg.response_message, cfg.port
    );

    let (broadcasting, mut events) = Broadcasting::new();
    let accept = cfg.accept_message.clone();
    let server_config = ServerConfig::new(cfg.port, cfg.response_message, move |m| m == accept)?;
    let token = broadcasting.start(server_config)?;

    // ── Event pump ────────────────────────────────────────────────────────────
    let pump = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ServerEvent::MessageReceiving {
                    addr,
                    message,
                    config,
                } => info!(
                    "'{addr}' sent '{message}'; reply on accept is '{}'",
                    config.response_message()
                ),
                ServerEvent::MessageReceived {
                    addr,
                    message,
                    config,
                } => info!(
                    "'{addr}' sent '{message}'; replied with '{}'",
                    config.response_message()
                ),
            }
        }
    });

    info!("server running; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    broadcasting.stop(token);
    pump.abort();
    info!("server stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
