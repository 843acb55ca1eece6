//! Identifier → supervisor mapping built once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use gamesrv_core::{
    OutputLine, RegistryError, ServerControl, ServerEvent, ServerSnapshot, ServerSpec,
    ServerStatus, StopOutcome, SupervisorError,
};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::supervisor::ProcessSupervisor;

/// Broadcast channel capacity for lifecycle events
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// All configured supervisors, keyed by server identifier.
///
/// The key set is fixed at construction, so lookups need no locking; each
/// supervisor serializes its own operations.
pub struct SupervisorRegistry {
    supervisors: Vec<Arc<ProcessSupervisor>>,
    index: HashMap<String, usize>,
    events: broadcast::Sender<ServerEvent>,
}

impl SupervisorRegistry {
    /// Build a registry, preserving the order of `specs`.
    pub fn new(specs: impl IntoIterator<Item = ServerSpec>) -> Result<Self, RegistryError> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let mut supervisors = Vec::new();
        let mut index = HashMap::new();

        for spec in specs {
            if index.contains_key(&spec.id) {
                return Err(RegistryError::DuplicateIdentifier(spec.id));
            }
            index.insert(spec.id.clone(), supervisors.len());
            supervisors.push(Arc::new(ProcessSupervisor::new(spec, events.clone())));
        }

        info!(servers = supervisors.len(), "Supervisor registry ready");
        Ok(Self {
            supervisors,
            index,
            events,
        })
    }

    /// Look up a supervisor by identifier.
    pub fn get(&self, id: &str) -> Option<&Arc<ProcessSupervisor>> {
        self.index.get(id).map(|&i| &self.supervisors[i])
    }

    fn resolve(&self, id: &str) -> Result<&Arc<ProcessSupervisor>, SupervisorError> {
        self.get(id).ok_or_else(|| SupervisorError::UnknownServer { id: id.to_string() })
    }

    /// Identifiers in configuration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.supervisors.iter().map(|s| s.id())
    }

    pub fn len(&self) -> usize {
        self.supervisors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supervisors.is_empty()
    }

    /// Subscribe to lifecycle events from every supervisor.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    /// Every identifier paired with a freshly probed status.
    pub fn statuses(&self) -> Vec<(String, ServerStatus)> {
        self.supervisors
            .iter()
            .map(|s| (s.id().to_string(), s.status()))
            .collect()
    }

    /// Gracefully stop every running server concurrently.
    ///
    /// Used when the host itself is shutting down.
    pub async fn shutdown_all(&self) {
        let running: Vec<_> = self
            .supervisors
            .iter()
            .filter(|s| s.status().is_running())
            .collect();
        if running.is_empty() {
            return;
        }

        info!(count = running.len(), "Stopping all running servers");
        let results = join_all(running.iter().map(|s| s.stop())).await;
        for (supervisor, result) in running.iter().zip(results) {
            match result {
                Ok(outcome) => info!(server = %supervisor.id(), ?outcome, "Server shut down"),
                Err(SupervisorError::NotRunning { .. }) => {}
                Err(e) => warn!(server = %supervisor.id(), error = %e, "Shutdown failed"),
            }
        }
    }
}

#[async_trait]
impl ServerControl for SupervisorRegistry {
    async fn start(&self, id: &str) -> Result<u32, SupervisorError> {
        self.resolve(id)?.start().await
    }

    async fn stop(&self, id: &str) -> Result<StopOutcome, SupervisorError> {
        self.resolve(id)?.stop().await
    }

    async fn kill(&self, id: &str) -> Result<(), SupervisorError> {
        self.resolve(id)?.kill().await
    }

    async fn status(&self, id: &str) -> Result<ServerStatus, SupervisorError> {
        Ok(self.resolve(id)?.status())
    }

    async fn execute_command(&self, id: &str, command: &str) -> Result<String, SupervisorError> {
        self.resolve(id)?.execute_command(command).await
    }

    async fn list_all(&self) -> Vec<ServerSnapshot> {
        self.supervisors.iter().map(|s| s.snapshot()).collect()
    }

    async fn recent_output(
        &self,
        id: &str,
        limit: usize,
    ) -> Result<Vec<OutputLine>, SupervisorError> {
        Ok(self.resolve(id)?.recent_output(limit))
    }

    fn spec(&self, id: &str) -> Result<ServerSpec, SupervisorError> {
        Ok(self.resolve(id)?.spec().clone())
    }
}
