//! Integration tests for the broadcast discovery lifecycle.
//!
//! # Purpose
//!
//! These tests exercise the library through its *public* API, the
//! [`Broadcasting`] facade, over real UDP sockets on OS-assigned free
//! ports.  They verify:
//!
//! - The happy path: an accepted message produces a reply with the
//!   configured response text plus both lifecycle events, in order.
//! - The filter path: a rejected message produces only the first event and
//!   no reply datagram.
//! - The full round-trip: a client broadcast reaches a local server and the
//!   client callback resolves to `Replied` with the server's answer.
//! - The timeout path: a query against a silent port resolves to `TimedOut`
//!   without blocking the call site.
//! - Registry behavior: distinct tokens, independent shutdown, and
//!   idempotent stops.
//!
//! # How a round-trip flows
//!
//! ```text
//! Client                               Server
//! ──────                               ──────
//! send "Hello Server" to
//!   255.255.255.255:port  ──────────▶  recv_from
//!                                      event: MessageReceiving
//!                                      filter("Hello Server") → accept
//!                        ◀──────────   send_to(sender, "Hello Client")
//! recv reply                           event: MessageReceived
//! callback(Replied { .. })
//! ```
//!
//! The driven-server tests send their datagram with a plain `UdpSocket`
//! straight to `127.0.0.1:port`; the server does not care whether a
//! datagram arrived via broadcast, and unicast keeps those tests
//! independent of the host's broadcast routing.

use std::net::UdpSocket;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use lanbeacon::{Broadcasting, ClientConfig, SendOutcome, ServerConfig, ServerEvent};

/// Finds a free UDP port by binding port 0 and reading back the
/// OS-assigned value.
fn free_udp_port() -> u16 {
    let probe = UdpSocket::bind("0.0.0.0:0").expect("probe bind");
    let port = probe.local_addr().unwrap().port();
    drop(probe);
    port
}

fn hello_config(port: u16) -> ServerConfig {
    ServerConfig::new(port, "Hello Client", |m| m == "Hello Server").unwrap()
}

/// Polls the aggregated event channel until an event arrives or `timeout`
/// elapses.
fn recv_event_within(
    rx: &mut tokio::sync::mpsc::Receiver<ServerEvent>,
    timeout: Duration,
) -> Option<ServerEvent> {
    let deadline = Instant::now() + timeout;
    loop {
        match rx.try_recv() {
            Ok(event) => return Some(event),
            Err(_) if Instant::now() >= deadline => return None,
            Err(_) => std::thread::sleep(Duration::from_millis(10)),
        }
    }
}

#[test]
fn test_accepted_message_gets_reply_and_both_events_in_order() {
    // Arrange
    let (broadcasting, mut events) = Broadcasting::new();
    let port = free_udp_port();
    let token = broadcasting.start(hello_config(port)).expect("start");

    let probe = UdpSocket::bind("0.0.0.0:0").expect("probe bind");
    probe
        .set_read_timeout(Some(Duration::from_secs(3)))
        .unwrap();

    // Act
    probe
        .send_to(b"Hello Server", ("127.0.0.1", port))
        .expect("send");
    let mut buf = [0u8; 64];
    let (len, from) = probe.recv_from(&mut buf).expect("reply expected");

    // Assert – the reply carries the configured response text
    assert_eq!(&buf[..len], b"Hello Client");
    assert_eq!(from.port(), port);

    // Assert – MessageReceiving precedes MessageReceived for the datagram
    let first = recv_event_within(&mut events, Duration::from_secs(3)).expect("first event");
    match first {
        ServerEvent::MessageReceiving {
            message, config, ..
        } => {
            assert_eq!(message, "Hello Server");
            assert_eq!(config.port(), port);
        }
        other => panic!("expected MessageReceiving first, got {other:?}"),
    }
    let second = recv_event_within(&mut events, Duration::from_secs(3)).expect("second event");
    match second {
        ServerEvent::MessageReceived {
            message, config, ..
        } => {
            assert_eq!(message, "Hello Server");
            assert_eq!(config.response_message(), "Hello Client");
        }
        other => panic!("expected MessageReceived second, got {other:?}"),
    }

    broadcasting.stop(token);
}

#[test]
fn test_rejected_message_emits_receiving_only_and_no_reply() {
    // Arrange
    let (broadcasting, mut events) = Broadcasting::new();
    let port = free_udp_port();
    let token = broadcasting.start(hello_config(port)).expect("start");

    let probe = UdpSocket::bind("0.0.0.0:0").expect("probe bind");
    probe
        .set_read_timeout(Some(Duration::from_millis(400)))
        .unwrap();

    // Act – the filter only accepts "Hello Server"
    probe
        .send_to(b"wrong greeting", ("127.0.0.1", port))
        .expect("send");

    // Assert – the receiving notification still fires
    let first = recv_event_within(&mut events, Duration::from_secs(3)).expect("receiving event");
    assert!(
        matches!(first, ServerEvent::MessageReceiving { ref message, .. } if message == "wrong greeting"),
        "expected MessageReceiving, got {first:?}"
    );

    // Assert – no reply datagram and no second event
    let mut buf = [0u8; 64];
    assert!(
        probe.recv_from(&mut buf).is_err(),
        "no reply must be sent for a rejected message"
    );
    assert!(
        recv_event_within(&mut events, Duration::from_millis(300)).is_none(),
        "no MessageReceived must follow a rejected message"
    );

    broadcasting.stop(token);
}

#[test]
fn test_malformed_datagram_does_not_kill_the_server() {
    // Arrange
    let (broadcasting, mut events) = Broadcasting::new();
    let port = free_udp_port();
    let token = broadcasting.start(hello_config(port)).expect("start");

    let probe = UdpSocket::bind("0.0.0.0:0").expect("probe bind");
    probe
        .set_read_timeout(Some(Duration::from_secs(3)))
        .unwrap();

    // Act – invalid UTF-8, then a well-formed accepted message
    probe
        .send_to(&[0xff, 0xfe, 0xfd], ("127.0.0.1", port))
        .expect("send garbage");
    probe
        .send_to(b"Hello Server", ("127.0.0.1", port))
        .expect("send");

    // Assert – the server survived the garbage and still replies
    let mut buf = [0u8; 64];
    let (len, _) = probe.recv_from(&mut buf).expect("reply expected");
    assert_eq!(&buf[..len], b"Hello Client");

    // The garbage produced no event; the first event belongs to the
    // well-formed message.
    let first = recv_event_within(&mut events, Duration::from_secs(3)).expect("event");
    assert!(
        matches!(first, ServerEvent::MessageReceiving { ref message, .. } if message == "Hello Server")
    );

    broadcasting.stop(token);
}

#[test]
fn test_full_broadcast_roundtrip_resolves_replied() {
    // Arrange
    let (broadcasting, _events) = Broadcasting::new();
    let port = free_udp_port();
    let token = broadcasting.start(hello_config(port)).expect("start");

    let query = ClientConfig::new(port, "Hello Server", Duration::from_secs(5)).unwrap();
    let (tx, rx) = mpsc::channel();

    // Act
    broadcasting
        .send(query, move |outcome| tx.send(outcome).unwrap())
        .expect("send");

    // Assert
    let outcome = rx
        .recv_timeout(Duration::from_secs(6))
        .expect("outcome must be delivered");
    match outcome {
        SendOutcome::Replied(response) => {
            assert_eq!(response.message(), "Hello Client");
            assert_eq!(response.config().message(), "Hello Server");
            assert_eq!(response.addr().port(), port);
        }
        SendOutcome::TimedOut => panic!("expected a reply from the local server"),
    }

    broadcasting.stop(token);
}

#[test]
fn test_client_times_out_against_a_silent_port() {
    // Arrange – nothing listens on this port
    let (broadcasting, _events) = Broadcasting::new();
    let port = free_udp_port();
    let query = ClientConfig::new(port, "Hello Server", Duration::from_millis(100)).unwrap();
    let (tx, rx) = mpsc::channel();

    // Act
    let started = Instant::now();
    broadcasting
        .send(query, move |outcome| tx.send(outcome).unwrap())
        .expect("send");
    let call_site = started.elapsed();

    // Assert – fire-and-forget at the call site, tagged timeout afterwards
    assert!(
        call_site < Duration::from_secs(1),
        "send must return promptly, took {call_site:?}"
    );
    let outcome = rx
        .recv_timeout(Duration::from_secs(3))
        .expect("outcome must be delivered");
    assert!(matches!(outcome, SendOutcome::TimedOut));
}

#[test]
fn test_two_servers_are_independently_stoppable() {
    // Arrange
    let (broadcasting, _events) = Broadcasting::new();
    let port_a = free_udp_port();
    let port_b = free_udp_port();
    let token_a = broadcasting.start(hello_config(port_a)).expect("start a");
    let token_b = broadcasting.start(hello_config(port_b)).expect("start b");
    assert_ne!(token_a, token_b);

    // Act – stop the first server only
    broadcasting.stop(token_a);

    // Assert – the second keeps answering
    let probe = UdpSocket::bind("0.0.0.0:0").expect("probe bind");
    probe
        .set_read_timeout(Some(Duration::from_secs(3)))
        .unwrap();
    probe
        .send_to(b"Hello Server", ("127.0.0.1", port_b))
        .expect("send");
    let mut buf = [0u8; 64];
    let (len, _) = probe.recv_from(&mut buf).expect("surviving server must reply");
    assert_eq!(&buf[..len], b"Hello Client");

    // Assert – the stopped server is gone
    probe
        .set_read_timeout(Some(Duration::from_millis(300)))
        .unwrap();
    probe
        .send_to(b"Hello Server", ("127.0.0.1", port_a))
        .expect("send");
    assert!(
        probe.recv_from(&mut buf).is_err(),
        "stopped server must not reply"
    );

    broadcasting.stop(token_b);
}

#[test]
fn test_stop_is_idempotent_and_unknown_tokens_are_ignored() {
    let (broadcasting, _events) = Broadcasting::new();
    let token = broadcasting.start(hello_config(free_udp_port())).expect("start");

    broadcasting.stop(token);
    broadcasting.stop(token);
    broadcasting.dispose_all();
}
