//! Bounded-duration capture of IQ datagrams to a file sink.
//!
//! The recorder drains its [`DatagramSource`] for a fixed wall-clock
//! duration and appends every payload to the sink in arrival order, with no
//! buffering layer in between — durability is favored over throughput.
//! Payload boundaries are not preserved in the sink; only the byte order
//! across consecutive receives is. Nothing reorders or deduplicates what
//! the network delivered.

use std::path::Path;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;

use crate::error::{LinkError, Result};
use crate::transport::DatagramSource;

/// Sleep between availability checks when the source is idle. Kept short so
/// capture latency stays well under one datagram cadence.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Captures datagram payloads from a [`DatagramSource`] into a file.
///
/// Owns the source and the sink for the span of one [`record`](Self::record)
/// run; neither is shared with other components.
pub struct IqRecorder<S: DatagramSource> {
    source: S,
}

impl<S: DatagramSource> IqRecorder<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Receive datagrams for `duration` and append their payloads to the
    /// file at `path` (created fresh, truncating any existing content).
    ///
    /// The run ends when the deadline elapses, never early — an empty
    /// datagram writes zero bytes and the loop continues. Any source or
    /// sink error aborts the run and propagates; bytes already written are
    /// retained. Returns the number of bytes captured.
    pub async fn record(&mut self, path: &Path, duration: Duration) -> Result<u64> {
        log::info!(
            "[iq] recording to {} for {:?}",
            path.display(),
            duration
        );

        let mut sink = File::create(path)
            .await
            .map_err(LinkError::Transport)
            .inspect_err(|e| log::error!("[iq] failed to open capture sink: {e}"))?;

        let deadline = Instant::now() + duration;
        let mut total: u64 = 0;

        while Instant::now() < deadline {
            if self.source.available() {
                let payload = match self.source.recv().await {
                    Ok(p) => p,
                    Err(e) => {
                        log::error!("[iq] error while receiving IQ data: {e}");
                        return Err(e);
                    }
                };
                if let Err(e) = sink.write_all(&payload).await {
                    log::error!("[iq] error while writing IQ data: {e}");
                    return Err(LinkError::Transport(e));
                }
                total += payload.len() as u64;
                log::debug!("[iq] received {} bytes", payload.len());
            } else {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }

        log::info!("[iq] finished recording; {total} bytes captured");
        Ok(total)
    }
}
