//! CLI bootstrap - the composition root.
//!
//! This module is the only place where configuration is turned into live
//! supervisors. Handlers receive a [`CliContext`] and talk to the servers
//! through [`ServerControl`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gamesrv_core::{ServerControl, load_specs};
use gamesrv_runtime::{DEFAULT_MONITOR_INTERVAL, SupervisorRegistry};
use tracing::info;

use crate::error::CliError;
use crate::parser::Cli;

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Path of the server configuration file.
    pub config_path: PathBuf,
    /// How often running servers are probed for crashes.
    pub monitor_interval: Duration,
}

impl CliConfig {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            monitor_interval: DEFAULT_MONITOR_INTERVAL,
        }
    }

    pub fn from_cli(cli: &Cli) -> Self {
        Self::new(cli.config.clone())
    }
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    /// Every configured supervisor.
    pub registry: Arc<SupervisorRegistry>,
    /// How often the console's status monitor probes.
    pub monitor_interval: Duration,
}

impl CliContext {
    /// The registry seen through the front-end port.
    pub fn control(&self) -> &dyn ServerControl {
        self.registry.as_ref()
    }
}

/// Load the configuration and build the supervisor registry.
pub fn bootstrap(config: &CliConfig) -> Result<CliContext, CliError> {
    let specs = load_specs(&config.config_path)?;
    let registry = SupervisorRegistry::new(specs)?;

    info!(
        path = %config.config_path.display(),
        servers = registry.len(),
        "Configuration loaded"
    );

    Ok(CliContext {
        registry: Arc::new(registry),
        monitor_interval: config.monitor_interval,
    })
}
