//! Port definitions (trait abstractions) and the error taxonomy.
//!
//! Front ends talk to supervisors only through [`ServerControl`] and only
//! ever see [`SupervisorError`]. No process or pipe types leak through here.

pub mod server_control;

use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub use server_control::ServerControl;

/// The supervisor operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Start,
    Stop,
    Kill,
    Status,
    Execute,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Kill => "kill",
            Self::Status => "status",
            Self::Execute => "execute",
        };
        f.write_str(name)
    }
}

/// Failures reported by supervisor operations.
///
/// Every variant carries the server id so front ends can render a message
/// without extra context.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Spawning the process failed; the supervisor stays stopped.
    #[error("failed to launch {id}: {reason}")]
    LaunchFailure { id: String, reason: String },

    /// `start` was called while a process is already owned.
    #[error("{id} is already running")]
    AlreadyActive { id: String },

    /// The operation needs a running process and there is none.
    #[error("{id} is not running")]
    NotRunning { id: String },

    /// No server with this identifier is configured.
    #[error("unknown server: {id}")]
    UnknownServer { id: String },

    /// The end marker did not arrive within the command budget.
    #[error("command on {id} timed out after {}s", timeout.as_secs_f32())]
    CommandTimeout { id: String, timeout: Duration },

    /// The command text was refused before any I/O happened.
    #[error("command rejected by {id}: {reason}")]
    CommandRejected { id: String, reason: String },

    /// I/O on an established process failed. The process has been discarded,
    /// except when only a command's output was lost to a lagging reader.
    #[error("{operation} on {id} failed: {reason}")]
    ProcessError {
        id: String,
        operation: Operation,
        reason: String,
    },
}

impl SupervisorError {
    /// Identifier of the server the failure refers to.
    pub fn server_id(&self) -> &str {
        match self {
            Self::LaunchFailure { id, .. }
            | Self::AlreadyActive { id }
            | Self::NotRunning { id }
            | Self::UnknownServer { id }
            | Self::CommandTimeout { id, .. }
            | Self::CommandRejected { id, .. }
            | Self::ProcessError { id, .. } => id,
        }
    }

    /// Precondition failures that leave state untouched and need no attention.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::AlreadyActive { .. } | Self::NotRunning { .. } | Self::UnknownServer { .. }
        )
    }
}

/// Failures building a registry from server specs.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate server identifier: {0}")]
    DuplicateIdentifier(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_name_the_server() {
        let err = SupervisorError::ProcessError {
            id: "mc".to_string(),
            operation: Operation::Execute,
            reason: "broken pipe".to_string(),
        };
        assert_eq!(err.server_id(), "mc");
        assert_eq!(err.to_string(), "execute on mc failed: broken pipe");
    }

    #[test]
    fn precondition_classification() {
        assert!(SupervisorError::NotRunning { id: "a".into() }.is_precondition());
        assert!(
            !SupervisorError::LaunchFailure {
                id: "a".into(),
                reason: "x".into()
            }
            .is_precondition()
        );
    }

    #[test]
    fn command_timeout_message_includes_budget() {
        let err = SupervisorError::CommandTimeout {
            id: "mc".into(),
            timeout: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "command on mc timed out after 5s");
    }
}
