//! Immutable launch and shutdown parameters for one supervised server.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

/// Default cooperative delay before a stop command or signal is delivered.
pub const DEFAULT_STOP_WAIT: Duration = Duration::from_secs(5);

/// Default time a server gets to exit after the stop command or signal.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(15);

/// Default budget for collecting the response to a console command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Default server-side command used to echo correlation markers.
pub const DEFAULT_ECHO_COMMAND: &str = "say";

/// How a server is asked to shut down gracefully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum StopStrategy {
    /// Write `command` followed by a newline to the server's stdin.
    Command { command: String },
    /// Deliver SIGINT to the server's process group.
    Signal,
}

/// Executable and arguments used to launch a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl LaunchCommand {
    /// Create a launch command with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Resolve the program path against a working directory.
    ///
    /// Relative paths that name a directory component (`./run.sh`,
    /// `bin/server`) are joined onto `working_dir`. Bare names are left
    /// alone so the OS can search `PATH`.
    pub fn resolve_program(&self, working_dir: Option<&Path>) -> PathBuf {
        match working_dir {
            Some(dir) if self.program.is_relative() && self.program.components().count() > 1 => {
                dir.join(&self.program)
            }
            _ => self.program.clone(),
        }
    }
}

/// Everything the supervisor needs to know about one server.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerSpec {
    /// Unique identifier, also the console command prefix.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    pub launch: LaunchCommand,
    /// Directory the process is started in (inherits the host's when `None`).
    pub working_dir: Option<PathBuf>,
    pub stop: StopStrategy,
    /// Delay before the stop command or signal is delivered.
    pub stop_wait: Duration,
    /// How long to wait for exit before escalating to a forced kill.
    pub stop_timeout: Duration,
    /// Total budget for collecting a console command's output.
    pub command_timeout: Duration,
    /// Server command that prints its argument back (e.g. `say`).
    pub echo_command: String,
    /// Whether arbitrary console commands may be sent to this server.
    pub allow_console_commands: bool,
}

impl ServerSpec {
    /// Create a spec with default timeouts and a `say`-based echo.
    pub fn new(id: impl Into<String>, launch: LaunchCommand, stop: StopStrategy) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            launch,
            working_dir: None,
            stop,
            stop_wait: DEFAULT_STOP_WAIT,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            echo_command: DEFAULT_ECHO_COMMAND.to_string(),
            allow_console_commands: false,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub const fn with_stop_wait(mut self, wait: Duration) -> Self {
        self.stop_wait = wait;
        self
    }

    #[must_use]
    pub const fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_echo_command(mut self, echo: impl Into<String>) -> Self {
        self.echo_command = echo.into();
        self
    }

    #[must_use]
    pub const fn with_console_commands(mut self, allowed: bool) -> Self {
        self.allow_console_commands = allowed;
        self
    }

    /// Program path as it will be handed to the OS.
    pub fn program_path(&self) -> PathBuf {
        self.launch.resolve_program(self.working_dir.as_deref())
    }
}
