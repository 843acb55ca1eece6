//! Fake game servers for integration tests.
//!
//! Each fake is a small POSIX shell script run through `/bin/sh`, so the
//! tests need no compiled fixtures.

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use gamesrv_core::{LaunchCommand, ServerSpec, StopStrategy};
use tempfile::TempDir;

/// Interactive server: echoes `say` arguments, answers `list`, exits on
/// `stop`, and prints unrelated noise on its own timer.
pub const INTERACTIVE_SERVER: &str = r#"
(while :; do echo "[noise] tick"; sleep 0.05; done) &
NOISE=$!
trap 'kill $NOISE 2>/dev/null' EXIT
echo 'Done (0.1s)! For help, type "help"'
while IFS= read -r line; do
  case "$line" in
    "say "*) echo "[Server] ${line#say }" ;;
    list) echo "There are 2 of a max of 20 players online:"; echo "alice, bob" ;;
    stop) echo "Stopping the server"; exit 0 ;;
    *) echo "Unknown command: $line" ;;
  esac
done
"#;

/// Server that reads its console but never reacts to anything.
pub const DEAF_SERVER: &str = r#"
echo "deaf server up"
while IFS= read -r line; do :; done
"#;

/// Server that crashes right after boot.
pub const CRASHING_SERVER: &str = r#"
echo "booting"
echo "fatal: world corrupted" >&2
exit 3
"#;

/// Server that closes its stdout as soon as a command round-trip begins.
pub const STDOUT_CLOSING_SERVER: &str = r#"
echo "ready"
while IFS= read -r line; do
  case "$line" in
    *gamesrv:begin:*) exec 1>&- ;;
  esac
done
"#;

/// Server that closes its console and keeps running.
pub const STDIN_CLOSING_SERVER: &str = r#"
exec 0<&-
echo "console closed"
sleep 30
"#;

/// Scratch directory holding one fake server script.
pub struct FakeServer {
    pub dir: TempDir,
    pub script: PathBuf,
}

impl FakeServer {
    pub fn new(body: &str) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let script = dir.path().join("run.sh");
        std::fs::write(&script, body).expect("write fake server script");
        Self { dir, script }
    }

    /// Spec with fast timeouts and a `stop` console command.
    pub fn spec(&self, id: &str) -> ServerSpec {
        ServerSpec::new(
            id,
            LaunchCommand::new("/bin/sh").with_args([self.script.display().to_string()]),
            StopStrategy::Command {
                command: "stop".to_string(),
            },
        )
        .with_working_dir(self.dir.path())
        .with_stop_wait(Duration::ZERO)
        .with_stop_timeout(Duration::from_secs(5))
        .with_command_timeout(Duration::from_secs(2))
        .with_console_commands(true)
    }
}

/// Give background readers time to drain pipes.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(300)).await;
}
