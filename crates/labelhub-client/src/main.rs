//! LabelHub CLI - Main entry point

use clap::Parser;
use labelhub_client::commands::{self, Context};
use labelhub_client::{Cli, Commands, Config, ConfigCommand};
use labelhub_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Warn })
        .output(LogOutput::Console)
        .log_file_prefix("labelhub")
        .build();

    // Environment variables take precedence over the flag
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging
    let _guard = init_logging(&log_config).ok();

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn execute_command(cli: &Cli) -> labelhub_client::Result<()> {
    let mut config = Config::load()?;
    if let Some(ref url) = cli.api_url {
        config.api_url = url.clone();
    }

    if let Commands::Config { command } = &cli.command {
        return match command {
            ConfigCommand::Show => commands::config::show(&config),
            ConfigCommand::Path => commands::config::path(),
        };
    }

    let ctx = Context::new(&config, cli.json)?;

    match &cli.command {
        Commands::Projects { command } => commands::projects::run(&ctx, command).await,
        Commands::Jobs { command } => commands::jobs::run(&ctx, command).await,
        Commands::Annotations { command } => commands::annotations::run(&ctx, command).await,
        Commands::Models { command } => commands::models::run(&ctx, command).await,
        Commands::Sessions { command } => commands::sessions::run(&ctx, command).await,
        Commands::Keys { command } => commands::keys::run(&ctx, command).await,
        Commands::Billing { command } => commands::billing::run(&ctx, command).await,
        Commands::Health => commands::health(&ctx).await,
        Commands::Config { .. } => Ok(()),
    }
}
