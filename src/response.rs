//! Control-channel response classification.
//!
//! A response is a single newline-terminated ASCII line. Lines beginning
//! with `ACK` acknowledge the pending command; lines beginning with `NAK`
//! reject it, carrying a fixed 3-character status code followed by a
//! free-text reason. Any other line is an out-of-band notice not tied to a
//! pending command — it is handed to an [`UnsolicitedHandler`] and never
//! satisfies a command wait.
//!
//! [`classify`] is a pure function; the unsolicited delegate is invoked by
//! the client, not here.

/// Literal prefix of a negative acknowledgement line.
const NAK_PREFIX: &str = "NAK";

/// Length of the NAK status code (e.g. `001`). Equal to the prefix length
/// only by coincidence.
const NAK_CODE_LEN: usize = 3;

/// Reason reported when a NAK line carries no free-text remainder.
const UNKNOWN_REASON: &str = "Unknown reason";

/// Classified outcome of one response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Positive acknowledgement; no payload.
    Ack,
    /// Negative acknowledgement with the device-supplied reason.
    Nak { reason: String },
    /// A line received outside the one-command/one-response cycle.
    Unsolicited { payload: String },
}

/// Receives out-of-band notices from the control channel.
///
/// Implementations must not assume any relation between the notice and the
/// command (if any) currently awaiting a response.
pub trait UnsolicitedHandler: Send {
    fn on_unsolicited(&mut self, payload: &str);
}

/// Default delegate: logs the notice at warn level and otherwise drops it.
pub struct LogUnsolicitedHandler;

impl UnsolicitedHandler for LogUnsolicitedHandler {
    fn on_unsolicited(&mut self, payload: &str) {
        log::warn!("[ctl] unsolicited message: {payload}");
    }
}

/// Classify one raw response line.
///
/// Trailing whitespace (including the newline terminator) is ignored. For
/// NAK lines the reason is the text after the 3-character status code,
/// trimmed; a NAK with no reason yields `"Unknown reason"`.
pub fn classify(line: &str) -> Response {
    let line = line.trim_end();
    if line.starts_with("ACK") {
        Response::Ack
    } else if line.starts_with(NAK_PREFIX) {
        Response::Nak {
            reason: nak_reason(line),
        }
    } else {
        Response::Unsolicited {
            payload: line.trim().to_string(),
        }
    }
}

/// Extract the free-text reason from a line already known to start `NAK`.
fn nak_reason(line: &str) -> String {
    // Skip "NAK", any separating whitespace, then the fixed status code.
    let rest = line[NAK_PREFIX.len()..].trim_start();
    let reason = rest.get(NAK_CODE_LEN..).map(str::trim).unwrap_or("");
    if reason.is_empty() {
        UNKNOWN_REASON.to_string()
    } else {
        reason.to_string()
    }
}
