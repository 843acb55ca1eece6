//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;
use gamesrv_core::{CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE};

use crate::commands::Commands;

/// Command-line interface for the game server supervisor.
#[derive(Parser)]
#[command(name = "gamesrv")]
#[command(about = "Supervise interactive game server processes")]
#[command(version)]
pub struct Cli {
    /// Server configuration file
    #[arg(
        short = 'c',
        long = "config",
        env = CONFIG_ENV_VAR,
        default_value = DEFAULT_CONFIG_FILE,
        global = true
    )]
    pub config: PathBuf,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Defaults to `console`
    #[command(subcommand)]
    pub command: Option<Commands>,
}
