//! Control-channel client: connection lifecycle plus the command/response
//! protocol engine.
//!
//! The protocol is strictly half-duplex per call: one command is written,
//! exactly one response is awaited, and the caller must not issue a second
//! command before the first resolves (`&mut self` on every operation
//! enforces this within a single client). Unsolicited lines that arrive
//! during a command wait are handed to the [`UnsolicitedHandler`] and the
//! wait continues — they never satisfy the pending command.
//!
//! No operation retries on failure; transport errors surface to the caller
//! unchanged after being logged.

use std::time::Duration;

use crate::command::Command;
use crate::error::{LinkError, Result};
use crate::response::{classify, LogUnsolicitedHandler, Response, UnsolicitedHandler};
use crate::transport::ControlStream;

/// Connection lifecycle state, owned exclusively by the client.
///
/// Transitions happen only through [`NetSdrClient::connect`] and
/// [`NetSdrClient::disconnect`]; streaming code never touches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

/// High-level client for a NetSDR-style receiver's control channel.
pub struct NetSdrClient<T: ControlStream> {
    transport: T,
    state: ConnectionState,
    unsolicited: Box<dyn UnsolicitedHandler>,
    /// Optional bound on one command's response wait. `None` reproduces the
    /// device's native behavior: a silent peer stalls the caller.
    response_timeout: Option<Duration>,
}

impl<T: ControlStream> NetSdrClient<T> {
    /// Create a client over `transport`. Unsolicited notices are logged at
    /// warn level unless a handler is installed via
    /// [`with_unsolicited_handler`](Self::with_unsolicited_handler).
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: ConnectionState::Disconnected,
            unsolicited: Box::new(LogUnsolicitedHandler),
            response_timeout: None,
        }
    }

    /// Install a delegate for out-of-band notices.
    pub fn with_unsolicited_handler(mut self, handler: Box<dyn UnsolicitedHandler>) -> Self {
        self.unsolicited = handler;
        self
    }

    /// Bound each command's response wait. Unset by default.
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = Some(timeout);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected && self.transport.is_connected()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Open the control connection to `host:port`.
    pub async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        if self.state == ConnectionState::Connected {
            log::error!("[ctl] connect called while already connected");
            return Err(LinkError::Connection(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "already connected",
            )));
        }
        match self.transport.connect(host, port).await {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                log::info!("[ctl] connected to {host}:{port}");
                Ok(())
            }
            Err(e) => {
                log::error!("[ctl] failed to connect to {host}:{port}: {e}");
                Err(e)
            }
        }
    }

    /// Flush and close the control connection.
    ///
    /// Safe to call when not connected (a no-op). The state returns to
    /// [`ConnectionState::Disconnected`] even when the close itself fails.
    pub async fn disconnect(&mut self) -> Result<()> {
        if self.state == ConnectionState::Disconnected {
            log::debug!("[ctl] disconnect with no active connection; nothing to do");
            return Ok(());
        }
        self.state = ConnectionState::Disconnected;
        match self.transport.disconnect().await {
            Ok(()) => {
                log::info!("[ctl] disconnected from device");
                Ok(())
            }
            Err(e) => {
                log::error!("[ctl] error during disconnect: {e}");
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// `set RX On` — ask the device to begin IQ streaming.
    pub async fn start_streaming(&mut self) -> Result<()> {
        self.send_command(Command::StartRx).await
    }

    /// `set RX Off` — ask the device to stop IQ streaming.
    pub async fn stop_streaming(&mut self) -> Result<()> {
        self.send_command(Command::StopRx).await
    }

    /// `set RXFrequency <hz>` — tune the receiver.
    pub async fn set_frequency(&mut self, hz: u64) -> Result<()> {
        self.send_command(Command::SetFrequency { hz }).await
    }

    /// Write one command and await its single response.
    ///
    /// Fails with [`LinkError::NotConnected`] before any bytes are written
    /// when no connection is active. A NAK response becomes
    /// [`LinkError::CommandRejected`] carrying the device-supplied reason.
    pub async fn send_command(&mut self, command: Command) -> Result<()> {
        if !self.is_connected() {
            log::warn!("[ctl] attempted to send command while not connected");
            return Err(LinkError::NotConnected);
        }

        log::info!("[ctl] sending command: {command}");
        if let Err(e) = self.transport.send(&command.wire_line()).await {
            log::error!("[ctl] failed to send command '{command}': {e}");
            return Err(e);
        }

        let response = match self.response_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.await_response()).await {
                Ok(r) => r,
                Err(_) => Err(LinkError::Transport(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "timed out waiting for command response",
                ))),
            },
            None => self.await_response().await,
        };

        match response {
            Ok(Response::Ack) => {
                log::info!("[ctl] ← ACK for '{command}'");
                Ok(())
            }
            Ok(Response::Nak { reason }) => {
                log::error!("[ctl] ← NAK for '{command}': {reason}");
                Err(LinkError::CommandRejected { reason })
            }
            Ok(Response::Unsolicited { .. }) => unreachable!("filtered by await_response"),
            Err(e) => {
                log::error!("[ctl] failed waiting for response to '{command}': {e}");
                Err(e)
            }
        }
    }

    /// Read until a line classifies as ACK or NAK; unsolicited lines are
    /// delegated and the wait re-entered.
    async fn await_response(&mut self) -> Result<Response> {
        loop {
            let line = self.transport.receive().await?;
            log::debug!("[ctl] ← {:?}", line.trim_end());
            match classify(&line) {
                Response::Unsolicited { payload } => {
                    self.unsolicited.on_unsolicited(&payload);
                }
                resolved => return Ok(resolved),
            }
        }
    }
}
