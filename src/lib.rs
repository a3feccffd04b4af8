//! `netsdr-link` — control and IQ capture for NetSDR-style receivers.
//!
//! # Architecture
//!
//! ```text
//!  ┌───────────────┐  "set RXFrequency …\n"  ┌────────────────┐
//!  │ NetSdrClient  │────────────────────────▶│ Device /       │
//!  │  (control)    │◀────────────────────────│ Emulator       │
//!  └──────┬────────┘      "ACK\n" / "NAK …"  └───────┬────────┘
//!         │ ControlStream (TCP)                      │ IQ datagrams (UDP)
//!         │                                          ▼
//!  ┌──────▼────────┐                         ┌────────────────┐
//!  │ TcpControl-   │                         │  IqRecorder    │
//!  │ Stream        │                         │  (capture)     │
//!  └───────────────┘                         └────────────────┘
//! ```
//!
//! Two independent channels: a reliable TCP **control channel** carrying
//! newline-terminated ASCII commands (one command, one ACK/NAK response,
//! strictly half-duplex per call) and a best-effort UDP **streaming channel**
//! carrying raw IQ sample payloads at a fixed cadence.
//!
//! Each module has a single responsibility:
//! - [`command`]   — command vocabulary and wire serialization
//! - [`response`]  — ACK/NAK/unsolicited response classification
//! - [`client`]    — control-channel session and command/response engine
//! - [`capture`]   — bounded-duration IQ datagram capture to a file sink
//! - [`emulator`]  — command-driven device emulator with a synthetic IQ generator
//! - [`transport`] — capability traits over the TCP/UDP transports
//! - [`error`]     — error taxonomy shared by all of the above

pub mod capture;
pub mod client;
pub mod command;
pub mod emulator;
pub mod error;
pub mod response;
pub mod transport;

pub use capture::IqRecorder;
pub use client::{ConnectionState, NetSdrClient};
pub use command::Command;
pub use emulator::Emulator;
pub use error::{LinkError, Result};
pub use response::{classify, Response, UnsolicitedHandler};
pub use transport::{
    ControlStream, DatagramSource, TcpControlStream, UdpDatagramSource, DEFAULT_CONTROL_PORT,
    DEFAULT_IQ_PORT,
};
