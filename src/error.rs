//! Error taxonomy for the control and streaming channels.
//!
//! Every failure propagates to the immediate caller unchanged after being
//! logged; no layer below `main` retries. The contract is "fail loudly and
//! leave state consistent", so a failed disconnect still leaves the client
//! in the `Disconnected` state and an aborted capture keeps whatever bytes
//! were already written.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LinkError>;

#[derive(Debug, Error)]
pub enum LinkError {
    /// The control transport could not be established (unreachable host,
    /// refused connection, invalid address).
    #[error("failed to establish control connection: {0}")]
    Connection(#[source] std::io::Error),

    /// A command operation was attempted without an active connection.
    /// Raised before any bytes are written.
    #[error("not connected to the device")]
    NotConnected,

    /// The device replied NAK; `reason` is the device-supplied text, verbatim.
    #[error("command rejected by device: {reason}")]
    CommandRejected { reason: String },

    /// Mid-session I/O failure on either channel: reset, closed peer,
    /// timeout, short read.
    #[error("transport error: {0}")]
    Transport(#[source] std::io::Error),

    /// Closing the control connection failed. The session state is still
    /// reset to `Disconnected` so a stuck stream cannot leak.
    #[error("failed to close control connection: {0}")]
    Disconnect(#[source] std::io::Error),
}
