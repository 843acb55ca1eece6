//! Signal delivery and exit waiting for supervised process groups.
//!
//! The child is always its own process group leader (see `spawn`), so its
//! PID doubles as the group id.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::timeout;
use tracing::debug;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// How long to wait for reaping after SIGKILL.
const REAP_TIMEOUT: Duration = Duration::from_secs(5);

/// Deliver SIGINT to the whole process group led by `pid`.
///
/// Returns `Ok(())` if the group is already gone.
pub fn interrupt_group(pid: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        signal_group(pid, Signal::SIGINT)
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "signal-based stop requires a Unix host",
        ))
    }
}

#[cfg(unix)]
fn signal_group(pid: u32, sig: Signal) -> io::Result<()> {
    let pgid = i32::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
    match signal::killpg(Pid::from_raw(pgid), sig) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(io::Error::other(e)),
    }
}

/// Wait up to `limit` for the child to exit.
///
/// `Ok(None)` means the limit elapsed with the process still alive.
pub async fn wait_for_exit(child: &mut Child, limit: Duration) -> io::Result<Option<ExitStatus>> {
    match timeout(limit, child.wait()).await {
        Ok(result) => result.map(Some),
        Err(_) => Ok(None),
    }
}

/// Forcefully terminate the child and its process group, then reap it.
///
/// Does not wait for graceful exit. Descendants left in the group are
/// killed too so a launch script cannot leave its server orphaned.
pub async fn terminate(child: &mut Child, pid: u32) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    signal_group(pid, Signal::SIGKILL)?;

    #[cfg(not(unix))]
    let _ = pid;

    // Covers non-Unix hosts and a leader that already left its group
    if let Err(e) = child.start_kill() {
        debug!(pid, error = %e, "start_kill after group kill");
    }

    match timeout(REAP_TIMEOUT, child.wait()).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("process {pid} was not reaped after SIGKILL"),
        )),
    }
}

/// Kill without waiting; used where awaiting is not possible.
///
/// The child is dropped afterwards and reaped by tokio in the background.
pub fn discard(mut child: Child, pid: u32) {
    #[cfg(unix)]
    if let Err(e) = signal_group(pid, Signal::SIGKILL) {
        debug!(pid, error = %e, "group kill while discarding process");
    }

    #[cfg(not(unix))]
    let _ = pid;

    let _ = child.start_kill();
}
