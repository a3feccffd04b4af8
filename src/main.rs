//! Entry point for `netsdr-link`.
//!
//! Parses CLI arguments and dispatches into either **emulator** or
//! **client** mode. All protocol work is delegated to library modules;
//! `main.rs` owns only process setup (logging, argument parsing) and the
//! sequencing of one capture session.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use netsdr_link::{
    Emulator, IqRecorder, NetSdrClient, TcpControlStream, UdpDatagramSource,
    DEFAULT_CONTROL_PORT, DEFAULT_IQ_PORT,
};

/// Control a NetSDR-style receiver and capture its IQ stream.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Run the device emulator (mock server for testing without hardware).
    Emulator {
        /// Control-channel TCP port to listen on.
        #[arg(long, default_value_t = DEFAULT_CONTROL_PORT)]
        tcp_port: u16,
        /// UDP port IQ datagrams are sent to (on loopback).
        #[arg(long, default_value_t = DEFAULT_IQ_PORT)]
        udp_port: u16,
    },
    /// Connect to a device, tune it, and capture IQ data to a file.
    Run {
        /// Device host name or address.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Control-channel TCP port.
        #[arg(long, default_value_t = DEFAULT_CONTROL_PORT)]
        port: u16,
        /// Tuner frequency in hertz.
        #[arg(long, default_value_t = 100_000_000)]
        frequency: u64,
        /// Capture duration in seconds.
        #[arg(long, default_value_t = 5)]
        duration: u64,
        /// Local UDP port the device streams to.
        #[arg(long, default_value_t = DEFAULT_IQ_PORT)]
        iq_port: u16,
        /// File the captured IQ bytes are written to.
        #[arg(long, default_value = "iq_data.bin")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();

    match cli.mode {
        Mode::Emulator { tcp_port, udp_port } => {
            let tcp = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), tcp_port);
            let udp = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), udp_port);
            Emulator::bind(tcp, udp).await?.run().await?;
        }
        Mode::Run {
            host,
            port,
            frequency,
            duration,
            iq_port,
            output,
        } => {
            let mut client = NetSdrClient::new(TcpControlStream::new());
            client.connect(&host, port).await?;

            // Always attempt a clean disconnect, even when the session fails.
            let session = run_session(
                &mut client,
                frequency,
                iq_port,
                &output,
                Duration::from_secs(duration),
            )
            .await;
            let closed = client.disconnect().await;

            session?;
            closed?;
        }
    }

    Ok(())
}

/// One capture session: tune, start streaming, record, stop streaming.
async fn run_session(
    client: &mut NetSdrClient<TcpControlStream>,
    frequency: u64,
    iq_port: u16,
    output: &std::path::Path,
    duration: Duration,
) -> Result<()> {
    client.set_frequency(frequency).await?;
    client.start_streaming().await?;

    let bind = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), iq_port);
    let source = UdpDatagramSource::bind(bind).await?;
    let captured = IqRecorder::new(source).record(output, duration).await?;
    log::info!("captured {captured} bytes to {}", output.display());

    client.stop_streaming().await?;
    Ok(())
}
