//! Device emulator: a NetSDR-style counterpart server for testing without
//! hardware.
//!
//! The emulator serves exactly one control connection. Every received line
//! is trimmed and acknowledged with `ACK\n` (this minimal model never
//! rejects); `set RX On` / `set RX Off` (case-insensitive) additionally
//! toggle a background generator that sends 1024-byte pseudo-random IQ
//! datagrams to a fixed destination every 50 ms. When the client
//! disconnects, the generator is stopped and the accept loop exits — the
//! emulator is built for one test session, not as a long-lived server.

use std::net::SocketAddr;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{LinkError, Result};

/// Bytes of pseudo-random IQ data per datagram.
pub const IQ_PAYLOAD_LEN: usize = 1024;

/// Pause between datagrams; simulates the device's sample-data rate.
pub const SEND_INTERVAL: Duration = Duration::from_millis(50);

/// One-session NetSDR device emulator.
pub struct Emulator {
    listener: TcpListener,
    /// Destination for generated IQ datagrams.
    udp_target: SocketAddr,
    transmitting: bool,
    generator: Option<(CancellationToken, JoinHandle<()>)>,
    shutdown: CancellationToken,
}

impl Emulator {
    /// Bind the control listener on `tcp_addr`; IQ datagrams will be sent
    /// to `udp_target` whenever streaming is on.
    pub async fn bind(tcp_addr: SocketAddr, udp_target: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(tcp_addr)
            .await
            .map_err(LinkError::Connection)?;
        Ok(Self {
            listener,
            udp_target,
            transmitting: false,
            generator: None,
            shutdown: CancellationToken::new(),
        })
    }

    /// Control-channel address after binding (resolves port 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(LinkError::Transport)
    }

    /// Token that stops the emulator from outside (e.g. a test harness or
    /// a signal handler).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Serve one control session, then return.
    pub async fn run(mut self) -> Result<()> {
        log::info!(
            "[emu] emulator started on TCP {}, streaming to UDP {}",
            self.local_addr()?,
            self.udp_target
        );

        let shutdown = self.shutdown.clone();
        let accepted = tokio::select! {
            _ = shutdown.cancelled() => None,
            accepted = self.listener.accept() => {
                Some(accepted.map_err(LinkError::Connection)?)
            }
        };

        match accepted {
            Some((stream, peer)) => {
                log::info!("[emu] accepted control client {peer}");
                let served = self.handle_client(stream).await;
                // Stop emitting even when the session ended in an error.
                self.stop_streaming();
                served?;
                log::info!("[emu] client disconnected; shutting down emulator");
            }
            None => {
                log::info!("[emu] shutdown requested before a client connected");
                self.stop_streaming();
            }
        }

        Ok(())
    }

    /// Read commands line-wise until the client disconnects or shutdown is
    /// requested; reply `ACK\n` to each and toggle the generator on the RX
    /// commands.
    async fn handle_client(&mut self, mut stream: TcpStream) -> Result<()> {
        let mut buf = [0u8; 1024];
        let shutdown = self.shutdown.clone();

        loop {
            let n = tokio::select! {
                _ = shutdown.cancelled() => break,
                read = stream.read(&mut buf) => read.map_err(LinkError::Transport)?,
            };
            if n == 0 {
                break; // zero-length read: peer closed
            }

            let cmd = String::from_utf8_lossy(&buf[..n]).trim().to_string();
            log::info!("[emu] received command: {cmd}");

            if cmd.eq_ignore_ascii_case("set RX On") {
                self.start_streaming();
            } else if cmd.eq_ignore_ascii_case("set RX Off") {
                self.stop_streaming();
            }

            stream
                .write_all(b"ACK\n")
                .await
                .map_err(LinkError::Transport)?;
        }
        Ok(())
    }

    /// Spawn the IQ generator. A no-op when already transmitting.
    fn start_streaming(&mut self) {
        if self.transmitting {
            return;
        }
        self.transmitting = true;
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(generate_iq(self.udp_target, cancel.clone()));
        self.generator = Some((cancel, handle));
        log::info!("[emu] started IQ transmission on UDP");
    }

    /// Cancel the IQ generator. A no-op when not transmitting.
    fn stop_streaming(&mut self) {
        if !self.transmitting {
            return;
        }
        self.transmitting = false;
        if let Some((cancel, _handle)) = self.generator.take() {
            cancel.cancel();
        }
        log::info!("[emu] stopped IQ transmission");
    }
}

/// Background generator task: send pseudo-random payloads to `target` at a
/// fixed cadence until `cancel` fires. Cancellation is cooperative and
/// checked before every send, so nothing goes out once the token has fired.
async fn generate_iq(target: SocketAddr, cancel: CancellationToken) {
    let socket = match UdpSocket::bind("127.0.0.1:0").await {
        Ok(s) => s,
        Err(e) => {
            log::error!("[emu] failed to bind IQ generator socket: {e}");
            return;
        }
    };

    let mut rng = StdRng::from_entropy();
    let mut payload = [0u8; IQ_PAYLOAD_LEN];

    while !cancel.is_cancelled() {
        rng.fill_bytes(&mut payload);
        if let Err(e) = socket.send_to(&payload, target).await {
            log::error!("[emu] IQ send failed: {e}");
            break;
        }
        log::debug!("[emu] sent IQ datagram of {} bytes", payload.len());

        tokio::select! {
            // A fired token must win over an elapsed sleep.
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(SEND_INTERVAL) => {}
        }
    }
    log::debug!("[emu] IQ generator stopped");
}
