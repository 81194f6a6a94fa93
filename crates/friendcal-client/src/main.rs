//! friendcal CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use friendcal_core::{TracingConfig, init_tracing};

use friendcal_client::cli::{Cli, Command, ConfigAction};
use friendcal_client::commands::{self, run::RunOptions};
use friendcal_client::config::ClientConfig;
use friendcal_client::error::{ClientError, ClientResult};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path),
        None => ClientConfig::load(),
    }
    .map_err(ClientError::Config)?;

    // --debug beats the configured level; RUST_LOG beats both
    let tracing = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli()
            .with_level_name(&config.logging.level)
            .map_err(|e| ClientError::Config(e.to_string()))?
    };
    init_tracing(tracing)?;

    match cli.command {
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(),
        },
        Some(Command::Run) | None => {
            let options = RunOptions {
                output: cli.output,
                stdout: cli.stdout,
                source: cli.source,
            };
            commands::run::run(&config, options).await
        }
    }
}
