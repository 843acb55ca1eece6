//! Process supervision runtime for `gamesrv`.
//!
//! [`ProcessSupervisor`] owns one interactive server process: it launches it
//! in its own process group, stops it gracefully (console command or SIGINT,
//! escalating to SIGKILL), probes it for crashes, and correlates console
//! commands with their output. [`SupervisorRegistry`] maps identifiers to
//! supervisors and implements the [`gamesrv_core::ServerControl`] port.

#![deny(unsafe_code)]

mod correlate;
mod monitor;
pub mod process;
mod registry;
mod supervisor;

pub use correlate::{CollectError, Markers, collect_response};
pub use monitor::{DEFAULT_MONITOR_INTERVAL, spawn_status_monitor};
pub use registry::SupervisorRegistry;
pub use supervisor::ProcessSupervisor;
