//! Console command grammar.
//!
//! Every line is `<prefix>.<verb> [argument]`. The reserved prefix `r` holds
//! commands that span all servers; any other prefix is a server identifier.
//! Parsing is pure: identifiers are not checked against the configuration
//! here, so an unknown prefix still reaches the registry and is reported as
//! an unknown server there.

/// Prefix of the console-wide commands.
pub const ROOT_PREFIX: &str = "r";

/// Lines shown by `<id>.logs` without an explicit count.
pub const DEFAULT_LOG_LINES: usize = 20;

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Blank line.
    Empty,
    /// `r.help`
    Help,
    /// `r.status`
    StatusAll,
    /// `r.quit`
    Quit,
    /// `<id>.<verb>`
    Server { id: String, action: ServerAction },
    /// Anything without a usable prefix.
    Unrecognized(String),
}

/// Per-server console verbs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerAction {
    Start,
    Stop,
    Kill,
    Status,
    Help,
    Logs(usize),
    /// Raw console command, gated per server.
    Cmd(String),
    /// Verb or argument that does not parse.
    Invalid(String),
}

/// Parse one line of console input.
pub fn parse_line(line: &str) -> ConsoleCommand {
    let line = line.trim();
    if line.is_empty() {
        return ConsoleCommand::Empty;
    }

    let Some((prefix, rest)) = line.split_once('.') else {
        return ConsoleCommand::Unrecognized(line.to_string());
    };
    if prefix.is_empty() || prefix.contains(char::is_whitespace) {
        return ConsoleCommand::Unrecognized(line.to_string());
    }

    let (verb, argument) = match rest.split_once(char::is_whitespace) {
        Some((verb, argument)) => (verb, argument.trim()),
        None => (rest, ""),
    };

    if prefix == ROOT_PREFIX {
        return match (verb, argument) {
            ("help", "") => ConsoleCommand::Help,
            ("status", "") => ConsoleCommand::StatusAll,
            ("quit", "") => ConsoleCommand::Quit,
            _ => ConsoleCommand::Unrecognized(line.to_string()),
        };
    }

    ConsoleCommand::Server {
        id: prefix.to_string(),
        action: parse_action(verb, argument),
    }
}

fn parse_action(verb: &str, argument: &str) -> ServerAction {
    match (verb, argument) {
        ("start", "") => ServerAction::Start,
        ("stop", "") => ServerAction::Stop,
        ("kill", "") => ServerAction::Kill,
        ("status", "") => ServerAction::Status,
        ("help", "") => ServerAction::Help,
        ("logs", "") => ServerAction::Logs(DEFAULT_LOG_LINES),
        ("logs", count) => match count.parse::<usize>() {
            Ok(n) if n > 0 => ServerAction::Logs(n),
            _ => ServerAction::Invalid(format!("logs {count}")),
        },
        ("cmd", "") => ServerAction::Invalid("cmd".to_string()),
        ("cmd", text) => ServerAction::Cmd(text.to_string()),
        (verb, "") => ServerAction::Invalid(verb.to_string()),
        (verb, argument) => ServerAction::Invalid(format!("{verb} {argument}")),
    }
}
