//! `check-config` command handler.

use std::path::Path;

use anyhow::Result;
use gamesrv_core::load_specs;

use crate::error::CliError;
use crate::presentation;

/// Load and validate the configuration, then print the server table.
///
/// Validation failures surface as [`CliError::Config`] (exit code 78).
pub fn execute(path: &Path) -> Result<()> {
    let specs = load_specs(path).map_err(CliError::from)?;

    println!("{}: {} server(s)\n", path.display(), specs.len());
    for line in presentation::spec_table(&specs) {
        println!("{line}");
    }
    Ok(())
}
