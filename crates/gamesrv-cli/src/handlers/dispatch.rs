//! Executes parsed console commands against a [`ServerControl`].

use std::io::{self, Write};

use gamesrv_core::{ServerControl, ServerSpec, SupervisorError};

use crate::console::{ConsoleCommand, ServerAction};
use crate::presentation;

/// Whether the console keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Run one console command, writing replies to `out` as they become
/// available.
///
/// Supervisor failures are replies, not errors; only writing to `out` can
/// fail.
pub async fn dispatch<W: Write + Send>(
    control: &dyn ServerControl,
    command: &ConsoleCommand,
    out: &mut W,
) -> io::Result<Flow> {
    match command {
        ConsoleCommand::Empty => {}
        ConsoleCommand::Quit => return Ok(Flow::Quit),
        ConsoleCommand::Help => {
            let servers = control.list_all().await;
            write_lines(out, presentation::root_help(&servers))?;
        }
        ConsoleCommand::StatusAll => {
            let servers = control.list_all().await;
            write_lines(out, servers.iter().map(presentation::status_line))?;
        }
        ConsoleCommand::Unrecognized(line) => {
            writeln!(out, "{}", presentation::unrecognized(line))?;
        }
        ConsoleCommand::Server { id, action } => {
            if let Err(err) = run_action(control, id, action, out).await? {
                writeln!(out, "{}", presentation::supervisor_error(&err))?;
            }
        }
    }
    out.flush()?;
    Ok(Flow::Continue)
}

async fn run_action<W: Write + Send>(
    control: &dyn ServerControl,
    id: &str,
    action: &ServerAction,
    out: &mut W,
) -> io::Result<Result<(), SupervisorError>> {
    // Resolving the server first reports unknown identifiers uniformly
    let spec = match control.spec(id) {
        Ok(spec) => spec,
        Err(err) => return Ok(Err(err)),
    };

    let reply = match action {
        ServerAction::Start => control
            .start(id)
            .await
            .map(|pid| vec![presentation::started(&spec, pid)]),
        ServerAction::Stop => {
            if control.status(id).await.is_ok_and(|s| s.is_running()) {
                writeln!(out, "{}", presentation::stop_notice(&spec))?;
                out.flush()?;
            }
            control
                .stop(id)
                .await
                .map(|outcome| vec![presentation::stop_outcome(&spec, outcome)])
        }
        ServerAction::Kill => control
            .kill(id)
            .await
            .map(|()| vec![format!("{} killed", spec.name)]),
        ServerAction::Status => control
            .status(id)
            .await
            .map(|status| vec![presentation::server_status(&spec, status)]),
        ServerAction::Help => Ok(presentation::server_help(&spec)),
        ServerAction::Logs(limit) => control.recent_output(id, *limit).await.map(|lines| {
            if lines.is_empty() {
                vec![format!("no output captured for {}", spec.name)]
            } else {
                lines.iter().map(presentation::output_line).collect()
            }
        }),
        ServerAction::Cmd(text) => execute_gated(control, &spec, text).await,
        ServerAction::Invalid(_) => Ok(vec![presentation::invalid_command(id)]),
    };

    match reply {
        Ok(lines) => {
            write_lines(out, lines)?;
            Ok(Ok(()))
        }
        Err(err) => Ok(Err(err)),
    }
}

/// Raw console commands are only forwarded for servers that opt in.
async fn execute_gated(
    control: &dyn ServerControl,
    spec: &ServerSpec,
    text: &str,
) -> Result<Vec<String>, SupervisorError> {
    if !spec.allow_console_commands {
        return Ok(vec![presentation::invalid_command(&spec.id)]);
    }
    let output = control.execute_command(&spec.id, text).await?;
    Ok(presentation::command_output(&output))
}

fn write_lines<W, I, S>(out: &mut W, lines: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for line in lines {
        writeln!(out, "{}", line.as_ref())?;
    }
    Ok(())
}
