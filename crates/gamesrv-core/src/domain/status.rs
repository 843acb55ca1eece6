//! Lifecycle state, status snapshots and events.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Internal lifecycle state of a supervisor.
///
/// A process handle is owned in every state except `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Stopped,
    Running,
    /// Graceful shutdown in progress; the process is still owned.
    Stopping,
}

impl LifecycleState {
    /// Whether a live process handle is held in this state.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
        }
    }
}

/// Externally visible status of a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerStatus {
    Running,
    Stopped,
}

impl ServerStatus {
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Point-in-time view of one server, used for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerSnapshot {
    pub id: String,
    pub name: String,
    pub status: ServerStatus,
    /// OS process id while running.
    pub pid: Option<u32>,
    pub started_at: Option<DateTime<Utc>>,
}

/// How a successful `stop` completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopOutcome {
    /// The process exited on its own within the stop timeout.
    Graceful,
    /// The stop timeout elapsed and the process group was killed.
    Escalated,
    /// Another caller's shutdown was already in flight and has been awaited.
    Joined,
}

/// Lifecycle transition published by a supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerEvent {
    pub id: String,
    pub state: LifecycleState,
    /// Set when the process was found to have exited without being asked to.
    pub unexpected: bool,
    pub at: DateTime<Utc>,
}

impl ServerEvent {
    pub fn new(id: impl Into<String>, state: LifecycleState) -> Self {
        Self {
            id: id.into(),
            state,
            unexpected: false,
            at: Utc::now(),
        }
    }

    #[must_use]
    pub const fn unexpected(mut self) -> Self {
        self.unexpected = true;
        self
    }
}

/// Which pipe a line of child output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// A single line of child output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl OutputLine {
    pub fn new(stream: OutputStream, text: impl Into<String>) -> Self {
        Self {
            stream,
            text: text.into(),
            at: Utc::now(),
        }
    }
}
