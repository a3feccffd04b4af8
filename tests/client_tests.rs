//! Tests for the control-channel client against an in-memory fake
//! transport, so no sockets are involved and every exchange is scripted.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use netsdr_link::error::LinkError;
use netsdr_link::transport::ControlStream;
use netsdr_link::{ConnectionState, NetSdrClient, UnsolicitedHandler};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Scripted [`ControlStream`]: records everything sent, replays queued
/// response lines.
#[derive(Default)]
struct FakeStream {
    connected: bool,
    refuse_connect: bool,
    fail_disconnect: bool,
    sent: Arc<Mutex<Vec<String>>>,
    replies: VecDeque<String>,
}

impl FakeStream {
    fn with_replies<const N: usize>(replies: [&str; N]) -> Self {
        Self {
            replies: replies.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    fn sent_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.sent)
    }
}

#[async_trait]
impl ControlStream for FakeStream {
    async fn connect(&mut self, _host: &str, _port: u16) -> Result<(), LinkError> {
        if self.refuse_connect {
            return Err(LinkError::Connection(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "refused",
            )));
        }
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), LinkError> {
        self.connected = false;
        if self.fail_disconnect {
            return Err(LinkError::Disconnect(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "close failed",
            )));
        }
        Ok(())
    }

    async fn send(&mut self, line: &str) -> Result<(), LinkError> {
        self.sent.lock().unwrap().push(line.to_string());
        Ok(())
    }

    async fn receive(&mut self) -> Result<String, LinkError> {
        match self.replies.pop_front() {
            Some(line) => Ok(line),
            None => {
                // A silent peer never resolves; park forever so timeout
                // behavior can be exercised.
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Collects unsolicited payloads for later assertions.
struct RecordingHandler(Arc<Mutex<Vec<String>>>);

impl UnsolicitedHandler for RecordingHandler {
    fn on_unsolicited(&mut self, payload: &str) {
        self.0.lock().unwrap().push(payload.to_string());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn set_frequency_sends_exact_wire_text() {
    let stream = FakeStream::with_replies(["ACK\n"]);
    let sent = stream.sent_handle();
    let mut client = NetSdrClient::new(stream);

    client.connect("127.0.0.1", 50000).await.expect("connect");
    client.set_frequency(123_456_789).await.expect("tune");

    assert_eq!(
        *sent.lock().unwrap(),
        vec!["set RXFrequency 123456789\n".to_string()]
    );
}

#[tokio::test]
async fn start_and_stop_send_rx_toggle_commands() {
    let stream = FakeStream::with_replies(["ACK\n", "ACK\n"]);
    let sent = stream.sent_handle();
    let mut client = NetSdrClient::new(stream);

    client.connect("127.0.0.1", 50000).await.expect("connect");
    client.start_streaming().await.expect("start");
    client.stop_streaming().await.expect("stop");

    assert_eq!(
        *sent.lock().unwrap(),
        vec!["set RX On\n".to_string(), "set RX Off\n".to_string()]
    );
}

#[tokio::test]
async fn command_while_disconnected_fails_without_sending_bytes() {
    let stream = FakeStream::with_replies(["ACK\n"]);
    let sent = stream.sent_handle();
    let mut client = NetSdrClient::new(stream);

    let err = client.start_streaming().await.expect_err("must fail");
    assert!(matches!(err, LinkError::NotConnected));
    assert!(sent.lock().unwrap().is_empty(), "no bytes may be written");
}

#[tokio::test]
async fn nak_reason_is_surfaced_verbatim() {
    let stream = FakeStream::with_replies(["NAK 001 Frequency out of range\n"]);
    let mut client = NetSdrClient::new(stream);

    client.connect("127.0.0.1", 50000).await.expect("connect");
    let err = client.start_streaming().await.expect_err("must be rejected");

    match err {
        LinkError::CommandRejected { reason } => {
            assert_eq!(reason, "Frequency out of range");
        }
        other => panic!("expected CommandRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn unsolicited_line_never_satisfies_a_command_wait() {
    let stream = FakeStream::with_replies(["overload warning\n", "ACK\n"]);
    let mut client = NetSdrClient::new(stream);
    let seen = Arc::new(Mutex::new(Vec::new()));
    client = client.with_unsolicited_handler(Box::new(RecordingHandler(Arc::clone(&seen))));

    client.connect("127.0.0.1", 50000).await.expect("connect");
    client.set_frequency(42).await.expect("command must resolve on the ACK");

    assert_eq!(*seen.lock().unwrap(), vec!["overload warning".to_string()]);
}

#[tokio::test]
async fn connect_failure_leaves_state_disconnected() {
    let stream = FakeStream {
        refuse_connect: true,
        ..FakeStream::default()
    };
    let mut client = NetSdrClient::new(stream);

    let err = client.connect("10.0.0.1", 50000).await.expect_err("refused");
    assert!(matches!(err, LinkError::Connection(_)));
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn connect_twice_is_rejected() {
    let stream = FakeStream::default();
    let mut client = NetSdrClient::new(stream);

    client.connect("127.0.0.1", 50000).await.expect("connect");
    let err = client.connect("127.0.0.1", 50000).await.expect_err("guarded");
    assert!(matches!(err, LinkError::Connection(_)));
    assert_eq!(client.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn disconnect_when_not_connected_is_a_noop() {
    let mut client = NetSdrClient::new(FakeStream::default());
    client.disconnect().await.expect("soft no-op");
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn failed_disconnect_still_resets_state() {
    let stream = FakeStream {
        fail_disconnect: true,
        ..FakeStream::default()
    };
    let mut client = NetSdrClient::new(stream);

    client.connect("127.0.0.1", 50000).await.expect("connect");
    let err = client.disconnect().await.expect_err("close fails");
    assert!(matches!(err, LinkError::Disconnect(_)));
    assert_eq!(
        client.state(),
        ConnectionState::Disconnected,
        "a stuck session must not leak"
    );
}

#[tokio::test]
async fn response_timeout_bounds_a_silent_peer() {
    // No replies queued: the fake's receive parks forever.
    let stream = FakeStream::default();
    let mut client =
        NetSdrClient::new(stream).with_response_timeout(Duration::from_millis(50));

    client.connect("127.0.0.1", 50000).await.expect("connect");
    let err = client.start_streaming().await.expect_err("must time out");
    match err {
        LinkError::Transport(e) => assert_eq!(e.kind(), std::io::ErrorKind::TimedOut),
        other => panic!("expected Transport timeout, got {other:?}"),
    }
}
