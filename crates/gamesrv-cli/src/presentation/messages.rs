//! Console reply texts.

use gamesrv_core::{
    LifecycleState, OutputLine, ServerEvent, ServerSnapshot, ServerSpec, ServerStatus,
    StopOutcome, SupervisorError,
};

use crate::console::ROOT_PREFIX;

/// `r.help`: console-wide commands and one line per server.
pub fn root_help(servers: &[ServerSnapshot]) -> Vec<String> {
    let mut lines = vec![
        format!("{ROOT_PREFIX}.help      this list"),
        format!("{ROOT_PREFIX}.status    status of every server"),
        format!("{ROOT_PREFIX}.quit      stop all servers and exit"),
    ];
    if servers.is_empty() {
        lines.push("no servers configured".to_string());
        return lines;
    }
    lines.push("servers (use <id>.help for their commands):".to_string());
    lines.extend(
        servers
            .iter()
            .map(|s| format!("  {:<10} {}", s.id, s.name)),
    );
    lines
}

/// `<id>.help`: the verbs available for one server.
pub fn server_help(spec: &ServerSpec) -> Vec<String> {
    let id = &spec.id;
    let mut lines = vec![
        format!("{} ({id}):", spec.name),
        format!("  {id}.start     launch the server"),
        format!("  {id}.stop      stop gracefully"),
        format!("  {id}.kill      terminate immediately"),
        format!("  {id}.status    running or not"),
        format!("  {id}.logs [n]  recent output"),
    ];
    if spec.allow_console_commands {
        lines.push(format!("  {id}.cmd <text> send a console command"));
    }
    lines
}

/// One row of `r.status`.
pub fn status_line(snapshot: &ServerSnapshot) -> String {
    match (snapshot.status, snapshot.pid, snapshot.started_at) {
        (ServerStatus::Running, Some(pid), Some(since)) => format!(
            "{:<10} running  pid {pid}, since {}",
            snapshot.id,
            since.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        (ServerStatus::Running, _, _) => format!("{:<10} running", snapshot.id),
        (ServerStatus::Stopped, _, _) => format!("{:<10} stopped", snapshot.id),
    }
}

/// `<id>.status`
pub fn server_status(spec: &ServerSpec, status: ServerStatus) -> String {
    if status.is_running() {
        format!("{} is running", spec.name)
    } else {
        format!("{} is not running", spec.name)
    }
}

pub fn started(spec: &ServerSpec, pid: u32) -> String {
    format!("{} started (pid {pid})", spec.name)
}

/// Printed before a stop begins, announcing the pre-stop wait.
pub fn stop_notice(spec: &ServerSpec) -> String {
    let wait = spec.stop_wait.as_secs();
    if wait == 0 {
        format!("Stopping {}...", spec.name)
    } else {
        format!("Stopping {} in {wait}s...", spec.name)
    }
}

pub fn stop_outcome(spec: &ServerSpec, outcome: StopOutcome) -> String {
    match outcome {
        StopOutcome::Graceful | StopOutcome::Joined => format!("{} stopped", spec.name),
        StopOutcome::Escalated => format!(
            "{} did not stop within {}s and was killed",
            spec.name,
            spec.stop_timeout.as_secs()
        ),
    }
}

pub fn invalid_command(id: &str) -> String {
    format!("invalid command, see {id}.help")
}

pub fn unrecognized(line: &str) -> String {
    format!("unrecognized input '{line}', see {ROOT_PREFIX}.help")
}

/// Reply for a failed operation.
pub fn supervisor_error(err: &SupervisorError) -> String {
    match err {
        SupervisorError::UnknownServer { id } => {
            format!("unknown server '{id}', see {ROOT_PREFIX}.help")
        }
        err if err.is_precondition() => err.to_string(),
        err => format!("error: {err}"),
    }
}

/// Output of a console command, one reply line per output line.
pub fn command_output(output: &str) -> Vec<String> {
    if output.is_empty() {
        return vec!["(no output)".to_string()];
    }
    output.lines().map(str::to_string).collect()
}

/// One line of `<id>.logs`.
pub fn output_line(line: &OutputLine) -> String {
    format!(
        "{} [{}] {}",
        line.at.format("%H:%M:%S"),
        line.stream.as_str(),
        line.text
    )
}

/// Lifecycle events worth interrupting the operator for.
///
/// Transitions caused by console commands are already acknowledged by their
/// replies, so only unexpected exits are shown.
pub fn event_line(event: &ServerEvent) -> Option<String> {
    (event.unexpected && event.state == LifecycleState::Stopped)
        .then(|| format!("{} exited unexpectedly", event.id))
}
