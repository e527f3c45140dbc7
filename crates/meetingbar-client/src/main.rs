//! meetingbar CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use meetingbar_core::{LogConfig, init_logging};

use meetingbar_client::cli::{Cli, Command, ConfigAction};
use meetingbar_client::commands;
use meetingbar_client::config::ClientConfig;
use meetingbar_client::error::ClientResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.as_deref();
    let config = ClientConfig::load(config_path)?;

    if let Err(e) = init_logging(&LogConfig::from_flags(cli.debug || config.debug, cli.json)) {
        eprintln!("warning: {e}");
    }

    match cli.resolved_command() {
        Command::Status => commands::status::run(&config, cli.json).await,
        Command::Calendars => commands::calendars::run(&config, cli.json).await,
        Command::Run => commands::run::run(config_path, &config, cli.json).await,
        Command::Join { id } => commands::join::run(&config, id.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(config_path),
        },
    }
}
