//! Lifecycle notifications emitted by running broadcast servers.

use std::net::SocketAddr;

use crate::config::ServerConfig;

/// A notification about one incoming datagram on a broadcast server.
///
/// For every decodable datagram the server emits [`MessageReceiving`]
/// before consulting the accept filter.  If the filter accepts and the
/// reply datagram went out, [`MessageReceived`] follows; a rejected or
/// unanswerable message produces no second event.  Within one datagram the
/// two events are therefore strictly ordered, and datagrams are processed
/// one at a time.
///
/// [`MessageReceiving`]: ServerEvent::MessageReceiving
/// [`MessageReceived`]: ServerEvent::MessageReceived
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// A datagram arrived and was decoded; no reply decision has been made.
    MessageReceiving {
        /// Address the datagram was sent from.
        addr: SocketAddr,
        /// The decoded message text.
        message: String,
        /// Configuration of the server that saw the message.
        config: ServerConfig,
    },
    /// The accept filter confirmed the message and the reply has been sent.
    MessageReceived {
        /// Address the reply was sent to.
        addr: SocketAddr,
        /// The decoded message text.
        message: String,
        /// Configuration of the server that replied.
        config: ServerConfig,
    },
}
