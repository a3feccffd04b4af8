//! Capability traits over the two channels, plus the real socket-backed
//! implementations.
//!
//! [`ControlStream`] abstracts the reliable, ordered control connection and
//! [`DatagramSource`] the best-effort streaming channel. The client and the
//! recorder depend only on these traits, so tests exercise them against
//! in-memory fakes without opening sockets.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};

use crate::error::{LinkError, Result};

/// Default control-channel TCP port.
pub const DEFAULT_CONTROL_PORT: u16 = 50_000;

/// Default streaming-channel UDP port.
pub const DEFAULT_IQ_PORT: u16 = 60_000;

/// Largest control-channel response line we will read in one call.
const RESPONSE_BUF: usize = 256;

/// Largest IQ datagram payload we accept.
const MAX_DATAGRAM: usize = 65_535;

// ---------------------------------------------------------------------------
// Control channel
// ---------------------------------------------------------------------------

/// A bidirectional, ordered, reliable byte stream to the device.
#[async_trait]
pub trait ControlStream: Send {
    /// Establish the connection. Fails without side effects if the peer is
    /// unreachable or refuses.
    async fn connect(&mut self, host: &str, port: u16) -> Result<()>;

    /// Flush pending writes and close. A no-op when not connected.
    async fn disconnect(&mut self) -> Result<()>;

    /// Write `line` exactly as given (the caller supplies the terminator).
    async fn send(&mut self, line: &str) -> Result<()>;

    /// Block for the next chunk of response text from the peer.
    ///
    /// Returns [`LinkError::Transport`] if the peer closed the connection.
    async fn receive(&mut self) -> Result<String>;

    /// Whether the underlying transport is currently established.
    fn is_connected(&self) -> bool;
}

/// [`ControlStream`] backed by a tokio TCP socket.
#[derive(Debug, Default)]
pub struct TcpControlStream {
    stream: Option<TcpStream>,
}

impl TcpControlStream {
    pub fn new() -> Self {
        Self { stream: None }
    }
}

#[async_trait]
impl ControlStream for TcpControlStream {
    async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(LinkError::Connection)?;
        self.stream = Some(stream);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        // Take the stream first so the session never leaks a half-closed
        // socket, even when flush or shutdown fails.
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        stream.flush().await.map_err(LinkError::Disconnect)?;
        stream.shutdown().await.map_err(LinkError::Disconnect)?;
        Ok(())
    }

    async fn send(&mut self, line: &str) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(LinkError::NotConnected)?;
        stream
            .write_all(line.as_bytes())
            .await
            .map_err(LinkError::Transport)?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<String> {
        let stream = self.stream.as_mut().ok_or(LinkError::NotConnected)?;
        let mut buf = [0u8; RESPONSE_BUF];
        let n = stream.read(&mut buf).await.map_err(LinkError::Transport)?;
        if n == 0 {
            return Err(LinkError::Transport(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "control connection closed by peer",
            )));
        }
        Ok(String::from_utf8_lossy(&buf[..n]).into_owned())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

// ---------------------------------------------------------------------------
// Streaming channel
// ---------------------------------------------------------------------------

/// An unreliable datagram source: availability query plus one receive.
///
/// No ordering or deduplication is promised beyond what the network
/// delivers; callers see payloads in OS receive order.
#[async_trait]
pub trait DatagramSource: Send {
    /// Whether a datagram is ready to be received without blocking.
    fn available(&mut self) -> bool;

    /// Receive the next datagram payload.
    async fn recv(&mut self) -> Result<Vec<u8>>;
}

/// [`DatagramSource`] backed by a bound tokio UDP socket.
///
/// `available` performs a non-blocking receive and stashes the outcome —
/// datagram or socket error — so the following
/// [`recv`](DatagramSource::recv) returns it immediately. A stashed error
/// still counts as "available"; swallowing it would let a dead socket idle
/// out a capture run instead of aborting it.
#[derive(Debug)]
pub struct UdpDatagramSource {
    socket: UdpSocket,
    pending: Option<Vec<u8>>,
    pending_err: Option<std::io::Error>,
}

impl UdpDatagramSource {
    /// Bind to `addr` (e.g. `0.0.0.0:60000`) and listen for IQ datagrams.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await.map_err(LinkError::Connection)?;
        log::info!("[iq] UDP receiver bound on {}", addr);
        Ok(Self {
            socket,
            pending: None,
            pending_err: None,
        })
    }

    /// Local address after binding (resolves port 0 to the assigned one).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(LinkError::Transport)
    }
}

#[async_trait]
impl DatagramSource for UdpDatagramSource {
    fn available(&mut self) -> bool {
        if self.pending.is_some() || self.pending_err.is_some() {
            return true;
        }
        let mut buf = vec![0u8; MAX_DATAGRAM];
        match self.socket.try_recv_from(&mut buf) {
            Ok((n, _)) => {
                buf.truncate(n);
                self.pending = Some(buf);
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => false,
            Err(e) => {
                self.pending_err = Some(e);
                true
            }
        }
    }

    async fn recv(&mut self) -> Result<Vec<u8>> {
        if let Some(e) = self.pending_err.take() {
            return Err(LinkError::Transport(e));
        }
        if let Some(payload) = self.pending.take() {
            return Ok(payload);
        }
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let (n, _) = self
            .socket
            .recv_from(&mut buf)
            .await
            .map_err(LinkError::Transport)?;
        buf.truncate(n);
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn idle_source() -> UdpDatagramSource {
        UdpDatagramSource::bind("127.0.0.1:0".parse().unwrap())
            .await
            .expect("bind")
    }

    #[tokio::test]
    async fn available_is_false_on_idle_socket() {
        let mut source = idle_source().await;
        assert!(!source.available(), "nothing queued, nothing failed");
    }

    #[tokio::test]
    async fn socket_error_counts_as_available_and_fails_recv() {
        let mut source = idle_source().await;
        source.pending_err = Some(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "socket reset",
        ));

        assert!(
            source.available(),
            "a failed socket must be reported, not idled over"
        );
        let err = source.recv().await.expect_err("stashed error must surface");
        match err {
            LinkError::Transport(e) => {
                assert_eq!(e.kind(), std::io::ErrorKind::ConnectionReset);
            }
            other => panic!("expected Transport, got {other:?}"),
        }
        assert!(
            !source.available(),
            "the error is surfaced once, not replayed"
        );
    }
}
