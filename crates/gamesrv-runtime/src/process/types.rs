//! Shared types for process management.

use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin};
use tokio::sync::broadcast;

/// A live child process and the pipes the supervisor owns.
pub struct RunningServer {
    pub child: Child,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    stdin: ChildStdin,
    /// Kept only to mint fresh subscribers; never read directly.
    stdout_lines: broadcast::Receiver<String>,
}

impl RunningServer {
    pub fn new(
        child: Child,
        pid: u32,
        stdin: ChildStdin,
        stdout_lines: broadcast::Receiver<String>,
    ) -> Self {
        Self {
            child,
            pid,
            started_at: Utc::now(),
            stdin,
            stdout_lines,
        }
    }

    /// Write one line to the child's stdin and flush it.
    pub async fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        self.stdin.write_all(&buf).await?;
        self.stdin.flush().await
    }

    /// Receive stdout lines emitted from now on.
    pub fn subscribe_stdout(&self) -> broadcast::Receiver<String> {
        self.stdout_lines.resubscribe()
    }
}
