//! Server control trait definition.
//!
//! This port is what a front end (chat bot, console, HTTP adapter) holds.
//! Every operation resolves the identifier first and reports
//! `SupervisorError::UnknownServer` when it is not configured.

use async_trait::async_trait;

use super::SupervisorError;
use crate::domain::{OutputLine, ServerSnapshot, ServerSpec, ServerStatus, StopOutcome};

/// Per-server lifecycle control, keyed by server identifier.
#[async_trait]
pub trait ServerControl: Send + Sync {
    /// Launch the server. Returns the OS process id.
    async fn start(&self, id: &str) -> Result<u32, SupervisorError>;

    /// Gracefully stop the server, escalating to a kill on timeout.
    async fn stop(&self, id: &str) -> Result<StopOutcome, SupervisorError>;

    /// Forcefully terminate the server. A no-op when already stopped.
    async fn kill(&self, id: &str) -> Result<(), SupervisorError>;

    /// Probe whether the server process is alive.
    async fn status(&self, id: &str) -> Result<ServerStatus, SupervisorError>;

    /// Send a console command and return the output it produced.
    async fn execute_command(&self, id: &str, command: &str) -> Result<String, SupervisorError>;

    /// Snapshot of every configured server, in configuration order.
    async fn list_all(&self) -> Vec<ServerSnapshot>;

    /// The newest `limit` lines of output captured for the server.
    async fn recent_output(&self, id: &str, limit: usize)
    -> Result<Vec<OutputLine>, SupervisorError>;

    /// Launch parameters of the server.
    fn spec(&self, id: &str) -> Result<ServerSpec, SupervisorError>;
}
