//! Core domain types, configuration and ports for `gamesrv`.
//!
//! This crate has no knowledge of processes or pipes. The runtime crate
//! implements [`ServerControl`]; front ends depend on the trait only.

#![deny(unused_crate_dependencies)]

pub mod config;
pub mod domain;
pub mod ports;

pub use config::{CONFIG_ENV_VAR, ConfigError, DEFAULT_CONFIG_FILE, GamesConfig, load_specs};
pub use domain::{
    LaunchCommand, LifecycleState, OutputLine, OutputStream, ServerEvent, ServerSnapshot,
    ServerSpec, ServerStatus, StopOutcome, StopStrategy,
};
pub use ports::{Operation, RegistryError, ServerControl, SupervisorError};

#[cfg(test)]
use tempfile as _;
