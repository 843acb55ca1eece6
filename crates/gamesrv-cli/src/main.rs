//! CLI entry point - the composition root.

use std::process::ExitCode;

use clap::Parser;

use gamesrv_cli::{Cli, CliConfig, Commands, bootstrap, exit_code_of, handlers, logging};

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::from_cli(&cli);

    match cli.command.unwrap_or(Commands::Console) {
        Commands::CheckConfig => handlers::check_config::execute(&config.config_path),
        Commands::Console => {
            let ctx = bootstrap(&config)?;
            handlers::console::execute(&ctx).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before parsing so `GAMESRV_CONFIG` can come from it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code_of(&err))
        }
    }
}
