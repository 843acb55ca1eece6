//! Lifecycle supervision of a single server process.
//!
//! Every operation that touches the child (`start`, `stop`, `kill`,
//! `execute_command`) runs under the supervisor's own mutex, so operations on
//! one server are totally ordered while different servers never contend.
//! The lifecycle state is additionally published through a `watch` channel so
//! it can be read while an operation is in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use gamesrv_core::{
    LifecycleState, Operation, OutputLine, OutputStream, ServerEvent, ServerSnapshot, ServerSpec,
    ServerStatus, StopOutcome, StopStrategy, SupervisorError,
};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::time::{Instant, sleep, timeout_at};
use tracing::{debug, info, warn};

use crate::correlate::{CollectError, Markers, collect_response};
use crate::process::{OutputLog, RunningServer, shutdown, spawn_server, spawn_stream_reader};

/// Capacity of the per-process stdout fan-out used by command correlation.
const STDOUT_CHANNEL_CAPACITY: usize = 1024;

type Handle = Option<RunningServer>;

/// Owns one server's child process and drives its lifecycle.
///
/// Invariant: `handle` is `Some` exactly when `state` is not `Stopped`.
pub struct ProcessSupervisor {
    spec: Arc<ServerSpec>,
    handle: Mutex<Handle>,
    state: watch::Sender<LifecycleState>,
    events: broadcast::Sender<ServerEvent>,
    output: OutputLog,
    /// Bumped whenever a `stop` call ends the process.
    stops_completed: AtomicU64,
}

impl ProcessSupervisor {
    /// Create a stopped supervisor publishing transitions on `events`.
    pub fn new(spec: ServerSpec, events: broadcast::Sender<ServerEvent>) -> Self {
        let (state, _) = watch::channel(LifecycleState::Stopped);
        Self {
            spec: Arc::new(spec),
            handle: Mutex::new(None),
            state,
            events,
            output: OutputLog::new(),
            stops_completed: AtomicU64::new(0),
        }
    }

    /// Create a supervisor whose events nobody listens to.
    pub fn standalone(spec: ServerSpec) -> Self {
        let (events, _) = broadcast::channel(16);
        Self::new(spec, events)
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn spec(&self) -> &ServerSpec {
        &self.spec
    }

    /// Last published lifecycle state, without probing the process.
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Watch lifecycle state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// The newest `limit` lines of captured output.
    pub fn recent_output(&self, limit: usize) -> Vec<OutputLine> {
        self.output.tail(limit)
    }

    /// The only place the lifecycle state changes.
    fn set_state(&self, next: LifecycleState, unexpected: bool) {
        let prev = self.state.send_replace(next);
        if prev != next {
            let mut event = ServerEvent::new(self.spec.id.clone(), next);
            if unexpected {
                event = event.unexpected();
            }
            // Nobody may be subscribed
            let _ = self.events.send(event);
        }
    }

    fn install(&self, handle: &mut Handle, running: RunningServer) {
        *handle = Some(running);
        self.set_state(LifecycleState::Running, false);
    }

    fn release(&self, handle: &mut Handle, unexpected: bool) -> Handle {
        let running = handle.take();
        self.set_state(LifecycleState::Stopped, unexpected);
        running
    }

    /// Drop a process whose pipes or OS state became unusable.
    fn discard(&self, handle: &mut Handle) {
        if let Some(running) = self.release(handle, true) {
            shutdown::discard(running.child, running.pid);
        }
    }

    fn process_error(&self, operation: Operation, reason: impl ToString) -> SupervisorError {
        SupervisorError::ProcessError {
            id: self.spec.id.clone(),
            operation,
            reason: reason.to_string(),
        }
    }

    fn command_timeout(&self) -> SupervisorError {
        SupervisorError::CommandTimeout {
            id: self.spec.id.clone(),
            timeout: self.spec.command_timeout,
        }
    }

    fn not_running(&self) -> SupervisorError {
        SupervisorError::NotRunning {
            id: self.spec.id.clone(),
        }
    }

    /// Re-check the live process and reconcile state if it has exited.
    ///
    /// Must be called with the handle lock held.
    fn probe(&self, handle: &mut Handle) -> ServerStatus {
        let Some(running) = handle.as_mut() else {
            return ServerStatus::Stopped;
        };

        match running.child.try_wait() {
            Ok(None) => ServerStatus::Running,
            Ok(Some(exit)) => {
                warn!(server = %self.spec.id, pid = running.pid, status = %exit, "Server exited unexpectedly");
                self.release(handle, true);
                ServerStatus::Stopped
            }
            Err(e) => {
                warn!(server = %self.spec.id, error = %e, "Failed to query process state, discarding it");
                self.discard(handle);
                ServerStatus::Stopped
            }
        }
    }

    /// Whether the server process is alive.
    ///
    /// Probes the OS when no other operation holds the supervisor. While one
    /// does, the published state is reported instead; a `Stopping` server
    /// still owns a live process and reads as `Running`.
    pub fn status(&self) -> ServerStatus {
        match self.handle.try_lock() {
            Ok(mut handle) => self.probe(&mut handle),
            Err(_) if self.state().is_active() => ServerStatus::Running,
            Err(_) => ServerStatus::Stopped,
        }
    }

    /// Listing entry for this server.
    pub fn snapshot(&self) -> ServerSnapshot {
        let (status, pid, started_at) = match self.handle.try_lock() {
            Ok(mut handle) => {
                let status = self.probe(&mut handle);
                let pid = handle.as_ref().map(|r| r.pid);
                let started_at = handle.as_ref().map(|r| r.started_at);
                (status, pid, started_at)
            }
            Err(_) => (self.status(), None, None),
        };

        ServerSnapshot {
            id: self.spec.id.clone(),
            name: self.spec.name.clone(),
            status,
            pid,
            started_at,
        }
    }

    /// Launch the server process.
    ///
    /// Returns the new PID, or `AlreadyActive` without touching a live process.
    pub async fn start(&self) -> Result<u32, SupervisorError> {
        let mut handle = self.handle.lock().await;
        if self.probe(&mut handle).is_running() {
            return Err(SupervisorError::AlreadyActive {
                id: self.spec.id.clone(),
            });
        }

        let launch_failure = |reason: String| SupervisorError::LaunchFailure {
            id: self.spec.id.clone(),
            reason,
        };

        let mut child = spawn_server(&self.spec).map_err(|e| {
            warn!(server = %self.spec.id, program = %self.spec.program_path().display(), error = %e, "Failed to launch server");
            launch_failure(e.to_string())
        })?;

        // Dropping the child on any early return kills it (kill_on_drop)
        let pid = child
            .id()
            .ok_or_else(|| launch_failure("process exited before it could be tracked".into()))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| launch_failure("stdin was not captured".into()))?;

        let (stdout_tx, stdout_rx) = broadcast::channel(STDOUT_CHANNEL_CAPACITY);
        if let Some(stdout) = child.stdout.take() {
            spawn_stream_reader(
                stdout,
                self.spec.id.clone(),
                OutputStream::Stdout,
                self.output.clone(),
                Some(stdout_tx),
            );
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_stream_reader(
                stderr,
                self.spec.id.clone(),
                OutputStream::Stderr,
                self.output.clone(),
                None,
            );
        }

        self.install(&mut handle, RunningServer::new(child, pid, stdin, stdout_rx));
        info!(server = %self.spec.id, pid, "Server started");
        Ok(pid)
    }

    /// Gracefully stop the server, escalating to a kill after the stop timeout.
    ///
    /// A caller that arrives while another stop is in flight, or that queued
    /// behind one on the lock, waits for it to finish and gets
    /// `StopOutcome::Joined`.
    ///
    /// The stop command write and the exit wait share one `stop_timeout`
    /// budget; a server that does not read its console is killed when it
    /// runs out.
    pub async fn stop(&self) -> Result<StopOutcome, SupervisorError> {
        if self.state() == LifecycleState::Stopping {
            return Ok(self.join_shutdown().await);
        }

        let stops_seen = self.stops_completed.load(Ordering::SeqCst);
        let mut handle = self.handle.lock().await;
        if !self.probe(&mut handle).is_running() {
            if self.stops_completed.load(Ordering::SeqCst) != stops_seen {
                debug!(server = %self.spec.id, "Server was stopped while waiting for the lock");
                return Ok(StopOutcome::Joined);
            }
            return Err(self.not_running());
        }
        let Some(running) = handle.as_mut() else {
            return Err(self.not_running());
        };
        let pid = running.pid;

        self.set_state(LifecycleState::Stopping, false);
        info!(server = %self.spec.id, pid, wait = ?self.spec.stop_wait, "Stopping server");
        if !self.spec.stop_wait.is_zero() {
            sleep(self.spec.stop_wait).await;
        }

        let deadline = Instant::now() + self.spec.stop_timeout;
        // Ok(false): the stop command could not be written in time
        let delivered = match &self.spec.stop {
            StopStrategy::Command { command } => {
                debug!(server = %self.spec.id, %command, "Sending stop command");
                match timeout_at(deadline, running.write_line(command)).await {
                    Ok(written) => written.map(|()| true),
                    Err(_) => Ok(false),
                }
            }
            StopStrategy::Signal => {
                debug!(server = %self.spec.id, pid, "Sending SIGINT to process group");
                shutdown::interrupt_group(pid).map(|()| true)
            }
        };

        let delivered = match delivered {
            Ok(delivered) => delivered,
            Err(e) => {
                warn!(server = %self.spec.id, error = %e, "Failed to deliver stop request, killing server");
                if let Err(kill_err) = shutdown::terminate(&mut running.child, pid).await {
                    warn!(server = %self.spec.id, error = %kill_err, "Forced termination failed");
                }
                self.release(&mut handle, true);
                self.stops_completed.fetch_add(1, Ordering::SeqCst);
                return Err(self.process_error(Operation::Stop, e));
            }
        };

        let exited = if delivered {
            let remaining = deadline.saturating_duration_since(Instant::now());
            shutdown::wait_for_exit(&mut running.child, remaining).await
        } else {
            warn!(server = %self.spec.id, "Server is not reading its console, stop command not delivered");
            Ok(None)
        };

        let outcome = match exited {
            Ok(Some(exit)) => {
                info!(server = %self.spec.id, status = %exit, "Server stopped");
                Ok(StopOutcome::Graceful)
            }
            Ok(None) => {
                warn!(
                    server = %self.spec.id,
                    timeout = ?self.spec.stop_timeout,
                    "Shutdown timed out, escalating to kill"
                );
                shutdown::terminate(&mut running.child, pid)
                    .await
                    .map(|_| StopOutcome::Escalated)
                    .map_err(|e| self.process_error(Operation::Stop, e))
            }
            Err(e) => Err(self.process_error(Operation::Stop, e)),
        };

        match outcome {
            Ok(_) => {
                self.release(&mut handle, false);
            }
            Err(_) => self.discard(&mut handle),
        }
        self.stops_completed.fetch_add(1, Ordering::SeqCst);
        outcome
    }

    /// Wait for an in-flight shutdown owned by another caller.
    async fn join_shutdown(&self) -> StopOutcome {
        debug!(server = %self.spec.id, "Stop already in progress, waiting for it");
        let mut state = self.state.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = state
            .wait_for(|s| *s != LifecycleState::Stopping)
            .await;
        StopOutcome::Joined
    }

    /// Forcefully terminate the server. A no-op when already stopped.
    pub async fn kill(&self) -> Result<(), SupervisorError> {
        let mut handle = self.handle.lock().await;
        let Some(running) = handle.as_mut() else {
            debug!(server = %self.spec.id, "Kill requested but server is not running");
            return Ok(());
        };

        let pid = running.pid;
        let result = shutdown::terminate(&mut running.child, pid).await;
        self.release(&mut handle, false);

        match result {
            Ok(exit) => {
                info!(server = %self.spec.id, pid, status = %exit, "Server killed");
                Ok(())
            }
            Err(e) => {
                warn!(server = %self.spec.id, pid, error = %e, "Kill did not complete cleanly");
                Err(self.process_error(Operation::Kill, e))
            }
        }
    }

    /// Send `command` to the server console and return the output it produced.
    ///
    /// At most one command is in flight per supervisor; the handle lock
    /// guarantees the marker lines of two commands never interleave.
    /// `command_timeout` bounds the stdin writes as well as the response, so
    /// a server that stops reading its console yields `CommandTimeout`.
    pub async fn execute_command(&self, command: &str) -> Result<String, SupervisorError> {
        let command = command.trim_end_matches(['\r', '\n']);
        let rejected = |reason: &str| SupervisorError::CommandRejected {
            id: self.spec.id.clone(),
            reason: reason.to_string(),
        };
        if command.trim().is_empty() {
            return Err(rejected("command is empty"));
        }
        if command.contains(['\r', '\n']) {
            return Err(rejected("command must be a single line"));
        }

        let mut handle = self.handle.lock().await;
        if !self.probe(&mut handle).is_running() {
            return Err(self.not_running());
        }
        let Some(running) = handle.as_mut() else {
            return Err(self.not_running());
        };

        let markers = Markers::generate();
        let mut lines = running.subscribe_stdout();
        let deadline = Instant::now() + self.spec.command_timeout;
        debug!(server = %self.spec.id, %command, "Executing console command");

        for line in markers.wrap(&self.spec.echo_command, command) {
            match timeout_at(deadline, running.write_line(&line)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(server = %self.spec.id, error = %e, "Failed to write to server stdin");
                    self.discard(&mut handle);
                    return Err(self.process_error(Operation::Execute, e));
                }
                Err(_) => {
                    warn!(server = %self.spec.id, %command, "Server stdin did not accept the command before the timeout");
                    return Err(self.command_timeout());
                }
            }
        }

        match collect_response(&mut lines, &markers, deadline).await {
            Ok(output) => Ok(output.join("\n")),
            Err(CollectError::TimedOut) => {
                warn!(server = %self.spec.id, %command, "No end marker before the command timeout");
                Err(self.command_timeout())
            }
            Err(CollectError::Lagged(skipped)) => {
                // The process is healthy; only this response is unusable
                warn!(server = %self.spec.id, skipped, "Command output was dropped");
                Err(self.process_error(
                    Operation::Execute,
                    format!("{skipped} output lines were dropped before the response was complete"),
                ))
            }
            Err(CollectError::Closed) => {
                warn!(server = %self.spec.id, "Server closed stdout during a command");
                self.discard(&mut handle);
                Err(self.process_error(Operation::Execute, "server output closed"))
            }
        }
    }
}
