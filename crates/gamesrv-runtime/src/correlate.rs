//! Marker-based correlation of console commands with their output.
//!
//! Server output has no framing, so a command is wrapped between two echo
//! commands carrying unique markers and only the lines printed between the
//! echoed markers are kept. A server that prints a marker on its own would
//! desynchronise collection; per-invocation tokens make that practically
//! impossible but it is not prevented at the protocol level.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{Instant, timeout_at};
use tracing::debug;
use uuid::Uuid;

/// Start/end sentinels for one command round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub start: String,
    pub end: String,
}

impl Markers {
    /// Fresh markers carrying a random token.
    pub fn generate() -> Self {
        let token = Uuid::new_v4().simple();
        Self {
            start: format!("[gamesrv:begin:{token}]"),
            end: format!("[gamesrv:end:{token}]"),
        }
    }

    /// The three stdin lines that make up one round-trip, in write order.
    pub fn wrap(&self, echo_command: &str, command: &str) -> [String; 3] {
        [
            format!("{echo_command} {}", self.start),
            command.to_string(),
            format!("{echo_command} {}", self.end),
        ]
    }
}

/// Why collection stopped without an end marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectError {
    /// The deadline passed first.
    TimedOut,
    /// The output stream ended (the process closed stdout).
    Closed,
    /// The receiver fell behind and this many lines were dropped, possibly
    /// including a marker.
    Lagged(u64),
}

/// Collect the lines printed between the start and end markers.
///
/// Lines before the start marker are ignored. Seeing the start marker again
/// restarts collection. The end marker line is not included. Partial output
/// is discarded on error.
///
/// A lagging receiver fails fast with [`CollectError::Lagged`] instead of
/// waiting for a marker that may have been among the dropped lines.
pub async fn collect_response(
    lines: &mut broadcast::Receiver<String>,
    markers: &Markers,
    deadline: Instant,
) -> Result<Vec<String>, CollectError> {
    let mut collected: Option<Vec<String>> = None;

    loop {
        let line = match timeout_at(deadline, lines.recv()).await {
            Err(_) => return Err(CollectError::TimedOut),
            Ok(Err(RecvError::Closed)) => return Err(CollectError::Closed),
            Ok(Err(RecvError::Lagged(skipped))) => return Err(CollectError::Lagged(skipped)),
            Ok(Ok(line)) => line,
        };

        if line.contains(&markers.start) {
            if collected.is_some() {
                debug!("start marker seen again, restarting collection");
            }
            collected = Some(Vec::new());
        } else if let Some(buf) = collected.as_mut() {
            if line.contains(&markers.end) {
                return Ok(std::mem::take(buf));
            }
            buf.push(line);
        }
    }
}
