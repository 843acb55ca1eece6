//! Shared CLI presentation utilities.
//!
//! Format-only: every function here turns domain values into text and never
//! talks to a supervisor.

pub mod messages;
pub mod tables;

pub use messages::{
    command_output, event_line, invalid_command, output_line, root_help, server_help,
    server_status, started, status_line, stop_notice, stop_outcome, supervisor_error,
    unrecognized,
};
pub use tables::{format_optional, separator, spec_table, truncate_string};
