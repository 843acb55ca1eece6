//! Async stream line readers (non-UTF8-safe).
//!
//! Game servers can emit non-UTF8 bytes on stdout/stderr. Using
//! `BufReader::lines()` would terminate the reader task on invalid UTF-8, so
//! lines are read as bytes and decoded lossily.
//!
//! The readers drain the pipes continuously, so a child never blocks on a
//! full pipe even when nobody is waiting for a command response.

use gamesrv_core::{OutputLine, OutputStream};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::broadcast;
use tracing::debug;

use super::logs::OutputLog;

/// Strip one trailing `\n` (and a preceding `\r`) in place.
fn trim_line_ending(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
}

/// Spawn a task that reads `stream` line by line until EOF.
///
/// Every line is appended to `log`. When `lines` is given, the line is also
/// broadcast to command correlation; dropping the task drops the sender, which
/// is how subscribers learn the stream has ended.
pub fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    server: String,
    stream_type: OutputStream,
    log: OutputLog,
    lines: Option<broadcast::Sender<String>>,
) {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    trim_line_ending(&mut buf);
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    debug!(server = %server, stream = stream_type.as_str(), "{}", line);
                    if let Some(ref tx) = lines {
                        // No subscribers outside of a command round-trip
                        let _ = tx.send(line.clone());
                    }
                    log.push(OutputLine::new(stream_type, line));
                }
                Err(e) => {
                    debug!(server = %server, stream = stream_type.as_str(), error = %e, "stream reader exiting due to read error");
                    break;
                }
            }
        }

        debug!(server = %server, stream = stream_type.as_str(), "stream reader task exiting");
    });
}
