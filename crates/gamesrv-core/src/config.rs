//! Configuration file format and loading.
//!
//! The file is read once at startup and converted into immutable
//! [`ServerSpec`]s. String-typed stop methods never survive past this module.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{
    DEFAULT_COMMAND_TIMEOUT, DEFAULT_ECHO_COMMAND, DEFAULT_STOP_TIMEOUT, DEFAULT_STOP_WAIT,
    LaunchCommand, ServerSpec, StopStrategy,
};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "GAMESRV_CONFIG";

/// Configuration file used when neither flag nor environment names one.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("server #{index}: {reason}")]
    Invalid { index: usize, reason: String },

    #[error("duplicate server identifier: {0}")]
    DuplicateIdentifier(String),

    #[error("no servers configured")]
    Empty,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GamesConfig {
    pub servers: Vec<ServerEntry>,
}

/// Stop method as written in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum StopEntry {
    Command { command: String },
    Signal,
}

/// One server as written in the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerEntry {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    pub stop: StopEntry,
    #[serde(default)]
    pub stop_wait_secs: Option<u64>,
    #[serde(default)]
    pub stop_timeout_secs: Option<u64>,
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
    #[serde(default)]
    pub echo_command: Option<String>,
    #[serde(default)]
    pub allow_console_commands: bool,
}

impl ServerEntry {
    fn into_spec(self, index: usize) -> Result<ServerSpec, ConfigError> {
        let invalid = |reason: &str| ConfigError::Invalid {
            index,
            reason: reason.to_string(),
        };

        let id = self.id.trim().to_string();
        if id.is_empty() {
            return Err(invalid("id must not be empty"));
        }
        if id.contains(char::is_whitespace) || id.contains('.') {
            return Err(invalid("id must not contain whitespace or '.'"));
        }
        if self.program.as_os_str().is_empty() {
            return Err(invalid("program must not be empty"));
        }

        let stop = match self.stop {
            StopEntry::Command { command } if command.trim().is_empty() => {
                return Err(invalid("stop command must not be empty"));
            }
            StopEntry::Command { command } => StopStrategy::Command { command },
            StopEntry::Signal => StopStrategy::Signal,
        };

        let command_timeout = self
            .command_timeout_secs
            .map_or(DEFAULT_COMMAND_TIMEOUT, Duration::from_secs);
        if command_timeout.is_zero() {
            return Err(invalid("command_timeout_secs must be positive"));
        }

        // Launch scripts run from their own directory unless told otherwise
        let working_dir = self.working_dir.or_else(|| {
            self.program
                .parent()
                .filter(|p| !p.as_os_str().is_empty() && self.program.is_absolute())
                .map(Path::to_path_buf)
        });

        let mut spec = ServerSpec::new(
            id.clone(),
            LaunchCommand::new(self.program).with_args(self.args),
            stop,
        )
        .with_name(self.name.unwrap_or(id))
        .with_stop_wait(self.stop_wait_secs.map_or(DEFAULT_STOP_WAIT, Duration::from_secs))
        .with_stop_timeout(
            self.stop_timeout_secs
                .map_or(DEFAULT_STOP_TIMEOUT, Duration::from_secs),
        )
        .with_command_timeout(command_timeout)
        .with_echo_command(
            self.echo_command
                .unwrap_or_else(|| DEFAULT_ECHO_COMMAND.to_string()),
        )
        .with_console_commands(self.allow_console_commands);
        spec.working_dir = working_dir;
        Ok(spec)
    }
}

impl GamesConfig {
    /// Parse configuration from a JSON string.
    pub fn from_json(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }

    /// Validate every entry and convert to specs, preserving order.
    pub fn into_specs(self) -> Result<Vec<ServerSpec>, ConfigError> {
        if self.servers.is_empty() {
            return Err(ConfigError::Empty);
        }

        let mut seen = HashSet::new();
        let mut specs = Vec::with_capacity(self.servers.len());
        for (index, entry) in self.servers.into_iter().enumerate() {
            let spec = entry.into_spec(index)?;
            if !seen.insert(spec.id.clone()) {
                return Err(ConfigError::DuplicateIdentifier(spec.id));
            }
            specs.push(spec);
        }
        Ok(specs)
    }
}

/// Load and validate the server specs from `path`.
pub fn load_specs(path: &Path) -> Result<Vec<ServerSpec>, ConfigError> {
    GamesConfig::load(path)?.into_specs()
}
