//! Interactive operator console.
//!
//! Reads one command per line from stdin until EOF, `r.quit` or Ctrl-C, then
//! stops every running server before returning. Unexpected exits noticed by
//! the status monitor are printed as they happen.
//!
//! Each server gets its own lane: commands for one server run in the order
//! they were typed, while a slow stop on one server does not hold up another
//! server or the prompt.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use gamesrv_core::ServerEvent;
use gamesrv_runtime::{SupervisorRegistry, spawn_status_monitor};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bootstrap::CliContext;
use crate::console::{ConsoleCommand, ROOT_PREFIX, parse_line};
use crate::handlers::dispatch::dispatch;
use crate::presentation;

/// Execute the console command on the process's stdin and stdout.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run(ctx, stdin, &mut stdout).await
}

/// Console loop over arbitrary input and output.
///
/// Servers are shut down even when reading or writing fails.
pub async fn run<R, W>(ctx: &CliContext, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send,
{
    let cancel = CancellationToken::new();
    let monitor = spawn_status_monitor(
        Arc::clone(&ctx.registry),
        ctx.monitor_interval,
        cancel.clone(),
    );
    let printer = spawn_event_printer(ctx.registry.subscribe(), cancel.clone());

    let result = read_commands(ctx, input, out).await;

    info!("Console closing, stopping running servers");
    ctx.registry.shutdown_all().await;
    cancel.cancel();
    if let Err(e) = tokio::try_join!(monitor, printer) {
        warn!(error = %e, "Background task failed");
    }

    result
}

async fn read_commands<R, W>(ctx: &CliContext, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send,
{
    writeln!(
        out,
        "{} server(s) configured, type r.help for commands",
        ctx.registry.len()
    )
    .context("Failed to write console banner")?;

    let (reply_tx, mut replies) = mpsc::unbounded_channel();
    let mut lanes = Lanes::new(Arc::clone(&ctx.registry), reply_tx);
    let mut result = accept_commands(input, &mut lanes, &mut replies, out).await;
    let mut workers = lanes.close();

    // Submitted commands run to completion so no server is left mid-stop
    loop {
        tokio::select! {
            reply = replies.recv() => {
                let Some(reply) = reply else { break };
                if result.is_ok() {
                    result = write_reply(out, &reply);
                }
            }
            signal = tokio::signal::ctrl_c() => {
                let pending = workers.len();
                workers.detach_all();
                signal.context("Failed to listen for Ctrl-C")?;
                info!(pending, "Interrupted, not waiting for running commands");
                return result;
            }
        }
    }

    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "Console lane failed");
        }
    }
    result
}

/// Read and submit commands until the input ends, `r.quit` or Ctrl-C,
/// printing replies as they arrive.
async fn accept_commands<R, W>(
    input: R,
    lanes: &mut Lanes,
    replies: &mut mpsc::UnboundedReceiver<String>,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send,
{
    let mut lines = input.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read console input")? else {
                    debug!("Console input closed");
                    return Ok(());
                };
                match parse_line(&line) {
                    ConsoleCommand::Empty => {}
                    ConsoleCommand::Quit => return Ok(()),
                    command => lanes.submit(command),
                }
            }
            Some(reply) = replies.recv() => write_reply(out, &reply)?,
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                info!("Interrupted");
                return Ok(());
            }
        }
    }
}

fn write_reply<W: Write>(out: &mut W, reply: &str) -> Result<()> {
    out.write_all(reply.as_bytes())
        .and_then(|()| out.flush())
        .context("Failed to write console reply")
}

/// One worker task per server id, plus one for console-wide commands.
struct Lanes {
    registry: Arc<SupervisorRegistry>,
    replies: mpsc::UnboundedSender<String>,
    senders: HashMap<String, mpsc::UnboundedSender<ConsoleCommand>>,
    workers: JoinSet<()>,
}

impl Lanes {
    fn new(registry: Arc<SupervisorRegistry>, replies: mpsc::UnboundedSender<String>) -> Self {
        Self {
            registry,
            replies,
            senders: HashMap::new(),
            workers: JoinSet::new(),
        }
    }

    fn submit(&mut self, command: ConsoleCommand) {
        let key = match &command {
            ConsoleCommand::Server { id, .. } => id.clone(),
            _ => ROOT_PREFIX.to_string(),
        };

        let lane = self.senders.entry(key).or_insert_with_key(|key| {
            let (tx, rx) = mpsc::unbounded_channel();
            let writer = ReplyWriter::new(self.replies.clone());
            self.workers
                .spawn(run_lane(Arc::clone(&self.registry), rx, writer));
            debug!(lane = %key, "Console lane opened");
            tx
        });

        if lane.send(command).is_err() {
            warn!("Console lane closed, command dropped");
        }
    }

    /// Stop accepting commands. Queued commands still run.
    fn close(self) -> JoinSet<()> {
        self.workers
    }
}

async fn run_lane(
    registry: Arc<SupervisorRegistry>,
    mut commands: mpsc::UnboundedReceiver<ConsoleCommand>,
    mut out: ReplyWriter,
) {
    while let Some(command) = commands.recv().await {
        if let Err(e) = dispatch(registry.as_ref(), &command, &mut out).await {
            debug!(error = %e, "Console output closed, lane exiting");
            break;
        }
    }
}

/// Buffers reply text and hands it to the console on every flush.
struct ReplyWriter {
    buf: Vec<u8>,
    replies: mpsc::UnboundedSender<String>,
}

impl ReplyWriter {
    const fn new(replies: mpsc::UnboundedSender<String>) -> Self {
        Self {
            buf: Vec::new(),
            replies,
        }
    }
}

impl Write for ReplyWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let text = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        self.replies
            .send(text)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "console output closed"))
    }
}

fn spawn_event_printer(
    mut events: broadcast::Receiver<ServerEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Ok(event) => {
                        if let Some(line) = presentation::event_line(&event) {
                            println!("{line}");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event printer lagging");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_writer_sends_on_flush_only() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut writer = ReplyWriter::new(tx);

        writeln!(writer, "Stopping Minecraft...").unwrap();
        assert!(rx.try_recv().is_err());

        writer.flush().unwrap();
        writer.flush().unwrap();
        assert_eq!(rx.try_recv().unwrap(), "Stopping Minecraft...\n");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn reply_writer_fails_once_console_is_gone() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut writer = ReplyWriter::new(tx);
        drop(rx);

        write!(writer, "late").unwrap();
        let err = writer.flush().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
