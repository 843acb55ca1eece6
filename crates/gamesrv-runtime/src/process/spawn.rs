//! Command builder for supervised servers.

use std::process::Stdio;

use gamesrv_core::ServerSpec;
use tokio::process::{Child, Command};
use tracing::debug;

/// Build the launch command for `spec`.
///
/// All three standard streams are piped. On Unix the child becomes the
/// leader of a new process group so group-directed signals reach the server
/// and its descendants but never the supervisor host.
pub fn build_command(spec: &ServerSpec) -> Command {
    let program = spec.program_path();
    let mut cmd = Command::new(&program);
    cmd.args(&spec.launch.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = &spec.working_dir {
        cmd.current_dir(dir);
    }

    #[cfg(unix)]
    cmd.process_group(0);

    debug!(
        server = %spec.id,
        program = %program.display(),
        args = ?spec.launch.args,
        cwd = ?spec.working_dir,
        "Built launch command"
    );
    cmd
}

/// Spawn the server process described by `spec`.
pub fn spawn_server(spec: &ServerSpec) -> std::io::Result<Child> {
    build_command(spec).spawn()
}
