//! The `gamesrv` operator front end.
//!
//! Wires configuration into a [`gamesrv_runtime::SupervisorRegistry`] and
//! drives it from a line-oriented console. Console commands are parsed by
//! [`console::parse_line`] and executed by [`handlers::dispatch`] against the
//! [`gamesrv_core::ServerControl`] port only.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tokio_test as _;

// Used by the binary only
use dotenvy as _;

pub mod bootstrap;
pub mod commands;
pub mod console;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::Commands;
pub use error::{CliError, exit_code_of};
pub use parser::Cli;
