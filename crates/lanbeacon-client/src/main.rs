//! Demo broadcast query client.
//!
//! Loads `lanbeacon-client.toml` from the working directory (defaults are
//! used when the file is absent), broadcasts one message, and prints the
//! outcome: the replying server's address and answer, or a timeout notice.
//!
//! ```toml
//! # lanbeacon-client.toml
//! port = 37455
//! message = "Hello Server"
//! timeout_secs = 10
//! ```

use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lanbeacon::{Broadcasting, ClientConfig, SendOutcome};

const CONFIG_FILE: &str = "lanbeacon-client.toml";

/// On-disk demo configuration; defaults mirror the demo server's greeting
/// exchange.
#[derive(Debug, Deserialize, PartialEq)]
struct DemoConfig {
    /// The UDP port to broadcast on.
    #[serde(default = "default_port")]
    port: u16,
    /// The message to broadcast.
    #[serde(default = "default_message")]
    message: String,
    /// How long to wait for a server reply, in seconds.
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

fn default_port() -> u16 {
    37455
}
fn default_message() -> String {
    "Hello Server".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            message: default_message(),
            timeout_secs: default_timeout_secs(),
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
    let query = ClientConfig::new(
        cfg.port,
        cfg.message.clone(),
        Duration::from_secs(cfg.timeout_secs),
    )?;

    info!("broadcasting '{}' on UDP {}", cfg.message, cfg.port);

    let (broadcasting, _events) = Broadcasting::new();
    let (tx, rx) = tokio::sync::oneshot::channel();
    broadcasting.send(query, move |outcome| {
        let _ = tx.send(outcome);
    })?;

    match rx.await {
        Ok(SendOutcome::Replied(response)) => info!(
            "'{}' answered '{}' with '{}'",
            response.addr(),
            response.config().message(),
            response.message()
        ),
        Ok(SendOutcome::TimedOut) => {
            warn!("no server answered within {}s", cfg.timeout_secs)
        }
        Err(_) => warn!("query ended without an outcome"),
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
