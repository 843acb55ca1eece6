//! Process management infrastructure for supervised servers.
//!
//! # Structure
//!
//! - `spawn` - launch command construction (piped stdio, own process group)
//! - `stream` - background line readers draining stdout/stderr
//! - `logs` - per-server ring buffer of recent output
//! - `shutdown` - group signalling, bounded exit waits, forced termination
//! - `types` - the owned handle of a live child

mod logs;
pub mod shutdown;
mod spawn;
mod stream;
mod types;

pub use logs::{MAX_OUTPUT_LINES, OutputLog};
pub use spawn::{build_command, spawn_server};
pub(crate) use stream::spawn_stream_reader;
pub use types::RunningServer;
