//! Table formatting utilities for CLI output.

use gamesrv_core::{ServerSpec, StopStrategy};

/// Truncates a string to at most `max_len` characters, adding "..." if needed.
///
/// # Examples
///
/// ```rust
/// use gamesrv_cli::presentation::truncate_string;
///
/// assert_eq!(truncate_string("Hello", 10), "Hello");
/// assert_eq!(truncate_string("Hello World", 8), "Hello...");
/// ```
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// A horizontal separator line.
pub fn separator(width: usize) -> String {
    "-".repeat(width)
}

/// Format an optional value for table display, returning a default if None.
pub fn format_optional<T: std::fmt::Display>(value: Option<&T>, default: &str) -> String {
    value.map_or_else(|| default.to_string(), ToString::to_string)
}

fn stop_method(stop: &StopStrategy) -> String {
    match stop {
        StopStrategy::Command { command } => format!("cmd '{command}'"),
        StopStrategy::Signal => "SIGINT".to_string(),
    }
}

/// The server table printed by `check-config`.
pub fn spec_table(specs: &[ServerSpec]) -> Vec<String> {
    let mut lines = Vec::with_capacity(specs.len() + 2);
    lines.push(format!(
        "{:<12} {:<20} {:<14} {:<12} {:<8} Program",
        "ID", "Name", "Stop", "Wait/Limit", "Console"
    ));
    lines.push(separator(90));

    for spec in specs {
        let timing = format!(
            "{}s/{}s",
            spec.stop_wait.as_secs(),
            spec.stop_timeout.as_secs()
        );
        let program = spec.program_path().display().to_string();
        let dir = spec
            .working_dir
            .as_ref()
            .map(|d| d.display().to_string());

        lines.push(format!(
            "{:<12} {:<20} {:<14} {:<12} {:<8} {} (in {})",
            truncate_string(&spec.id, 12),
            truncate_string(&spec.name, 20),
            truncate_string(&stop_method(&spec.stop), 14),
            timing,
            if spec.allow_console_commands { "yes" } else { "no" },
            program,
            format_optional(dir.as_ref(), "."),
        ));
    }
    lines
}
