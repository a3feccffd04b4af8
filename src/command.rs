//! Control-channel command vocabulary and wire serialization.
//!
//! Commands are immutable text directives, constructed per call and never
//! retained. The wire format is newline-terminated ASCII (see
//! [`Command::wire_line`]).

use std::fmt;

/// The three receiver commands this client models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `set RX On` — begin IQ streaming.
    StartRx,
    /// `set RX Off` — stop IQ streaming.
    StopRx,
    /// `set RXFrequency <hz>` — tune the receiver.
    SetFrequency { hz: u64 },
}

impl Command {
    /// Command text without the terminating newline.
    pub fn text(&self) -> String {
        match self {
            Command::StartRx => "set RX On".to_string(),
            Command::StopRx => "set RX Off".to_string(),
            Command::SetFrequency { hz } => format!("set RXFrequency {hz}"),
        }
    }

    /// Full wire representation: command text terminated by `\n`.
    pub fn wire_line(&self) -> String {
        format!("{}\n", self.text())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_rx_wire_text() {
        assert_eq!(Command::StartRx.wire_line(), "set RX On\n");
    }

    #[test]
    fn stop_rx_wire_text() {
        assert_eq!(Command::StopRx.wire_line(), "set RX Off\n");
    }

    #[test]
    fn set_frequency_wire_text() {
        let cmd = Command::SetFrequency { hz: 100_000_000 };
        assert_eq!(cmd.wire_line(), "set RXFrequency 100000000\n");
    }

    #[test]
    fn set_frequency_zero_is_valid() {
        let cmd = Command::SetFrequency { hz: 0 };
        assert_eq!(cmd.text(), "set RXFrequency 0");
    }

    #[test]
    fn display_matches_text() {
        let cmd = Command::SetFrequency { hz: 42 };
        assert_eq!(cmd.to_string(), cmd.text());
    }
}
