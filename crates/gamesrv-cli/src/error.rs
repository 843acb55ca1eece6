//! CLI-specific error types and mappings.
//!
//! Library errors are folded into [`CliError`], which knows its process exit
//! code. Console replies never go through here; only failures that end the
//! process do.

use gamesrv_core::{ConfigError, RegistryError, SupervisorError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument or identifier error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (unreadable terminal, closed pipe, ...).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Supervisor or process error.
    #[error("Process error: {0}")]
    Process(String),
}

impl CliError {
    /// Map error to a sysexits-style exit code.
    ///
    /// - 2: invalid arguments (`EX_USAGE` is reserved by clap for the same)
    /// - 74: `EX_IOERR`
    /// - 78: `EX_CONFIG`
    /// - 71: `EX_OSERR`
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Arguments(_) => 2,
            Self::Io(_) => 74,
            Self::Config(_) => 78,
            Self::Process(_) => 71,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        // A missing file is a configuration mistake, anything else is I/O
        let unreadable = matches!(
            &err,
            ConfigError::Read { source, .. } if source.kind() != std::io::ErrorKind::NotFound
        );
        if unreadable {
            Self::Io(err.to_string())
        } else {
            Self::Config(err.to_string())
        }
    }
}

impl From<RegistryError> for CliError {
    fn from(err: RegistryError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<SupervisorError> for CliError {
    fn from(err: SupervisorError) -> Self {
        match err {
            SupervisorError::UnknownServer { .. } => Self::Arguments(err.to_string()),
            other => Self::Process(other.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Exit code for an error that reached `main`.
///
/// Looks for a [`CliError`] or a bare I/O error anywhere in the chain and
/// falls back to 1.
pub fn exit_code_of(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(cli) = cause.downcast_ref::<CliError>() {
            return cli.exit_code();
        }
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return 74;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn config_errors_map_to_ex_config() {
        let err = CliError::from(ConfigError::DuplicateIdentifier("mc".into()));
        assert_eq!(err.exit_code(), 78);
        assert!(err.to_string().contains("duplicate server identifier: mc"));

        let missing = CliError::from(ConfigError::Read {
            path: "config.json".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
        assert_eq!(missing.exit_code(), 78);
    }

    #[test]
    fn unreadable_config_maps_to_ex_ioerr() {
        let err = CliError::from(ConfigError::Read {
            path: "config.json".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        });
        assert_eq!(err.exit_code(), 74);
    }

    #[test]
    fn supervisor_errors() {
        let unknown = CliError::from(SupervisorError::UnknownServer { id: "xyz".into() });
        assert_eq!(unknown.exit_code(), 2);

        let launch = CliError::from(SupervisorError::LaunchFailure {
            id: "mc".into(),
            reason: "No such file or directory".into(),
        });
        assert_eq!(launch.exit_code(), 71);
    }

    #[test]
    fn exit_code_walks_the_chain() {
        let err = anyhow::Error::from(CliError::from(RegistryError::DuplicateIdentifier(
            "mc".into(),
        )))
        .context("bootstrap failed");
        assert_eq!(exit_code_of(&err), 78);

        let io: anyhow::Result<()> =
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe)).context("reading console");
        assert_eq!(exit_code_of(&io.unwrap_err()), 74);

        assert_eq!(exit_code_of(&anyhow::anyhow!("something else")), 1);
    }
}
