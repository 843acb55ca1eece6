//! Subcommand definitions.

use clap::Subcommand;

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the interactive operator console on stdin/stdout
    ///
    /// Servers are stopped gracefully when the console exits (EOF, `r.quit`
    /// or Ctrl-C).
    Console,

    /// Load and validate the configuration, then print the server table
    CheckConfig,
}
