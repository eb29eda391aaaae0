//! # lanbeacon
//!
//! UDP broadcast discovery for local networks: answerable reply servers and
//! a single-shot query client, managed behind the [`Broadcasting`] facade.
//!
//! A server binds a UDP port and answers broadcast datagrams that pass a
//! caller-supplied accept filter, emitting a [`ServerEvent`] for each
//! datagram it sees and each reply it sends.  A client sends one datagram to
//! the limited broadcast address and waits for the first reply, resolving to
//! a tagged [`SendOutcome`] when the reply arrives or the timeout elapses.
//!
//! ```no_run
//! use std::time::Duration;
//! use lanbeacon::{Broadcasting, ClientConfig, SendOutcome, ServerConfig};
//!
//! let (broadcasting, _events) = Broadcasting::new();
//!
//! // Answer "Hello Server" with "Hello Client" on UDP 37455.
//! let config = ServerConfig::new(37455, "Hello Client", |m| m == "Hello Server")?;
//! let token = broadcasting.start(config)?;
//!
//! // Ask the network who is out there.
//! let query = ClientConfig::new(37455, "Hello Server", Duration::from_secs(10))?;
//! broadcasting.send(query, |outcome| match outcome {
//!     SendOutcome::Replied(response) => println!("{} answered", response.addr()),
//!     SendOutcome::TimedOut => println!("nobody home"),
//! })?;
//!
//! broadcasting.stop(token);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Blocking socket I/O runs on dedicated named threads, never on an async
//! runtime; events cross over to async consumers through `tokio::sync::mpsc`
//! channels.

pub mod broadcasting;
pub mod client;
pub mod config;
pub mod event;
pub mod server;
pub mod token;

pub use broadcasting::Broadcasting;
pub use client::{BroadcastClient, ClientError, SendOutcome, ServerResponse};
pub use config::{ClientConfig, ConfigError, MessageFilter, ServerConfig};
pub use event::ServerEvent;
pub use server::{BroadcastServer, ServerError};
pub use token::ServerToken;
