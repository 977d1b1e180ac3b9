// hardware/alert.rs
// Obstacle alert for a terminal session: rings the bell and logs a warning.

use log::warn;
use std::io::Write;

use super::AlertSink;

/// Alert that rings the terminal bell
#[derive(Debug, Default)]
pub struct TerminalBell;

impl AlertSink for TerminalBell {
    fn notify(&mut self) {
        warn!("Obstacle detected! Avoiding...");
        let mut err = std::io::stderr();
        // Bell failures are not worth surfacing
        let _ = err.write_all(b"\x07").and_then(|_| err.flush());
    }
}
