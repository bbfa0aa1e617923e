//! Overload CLI entry point.

use anyhow::Context;
use clap::Parser;

use overload::cli::commands::{cache, init, plan, plateau, progress, suggestion, workout};
use overload::cli::{handle_error, Cli, Commands};
use overload::infrastructure::config::ConfigLoader;
use overload::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;
    if let Err(err) = run(cli).await {
        handle_error(err, json);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ConfigLoader::load().context("Failed to load configuration")?;

    let mut log_config = LogConfig::from(&config.logging);
    if let Some(level) = cli.log_level {
        log_config = log_config.with_level(level);
    }
    let _logger = LoggerImpl::init(&log_config)?;

    let (user, json) = (cli.user.as_str(), cli.json);
    match cli.command {
        Commands::Init(args) => init::execute(args, json).await,
        Commands::Workout(args) => workout::execute(args, user, config, json).await,
        Commands::Progress(args) => progress::execute(args, user, config, json).await,
        Commands::Plateau(args) => plateau::execute(args, user, config, json).await,
        Commands::Suggestion(args) => suggestion::execute(args, user, config, json).await,
        Commands::Plan(args) => plan::execute(args, user, config, json).await,
        Commands::Cache(args) => cache::execute(args, user, config, json).await,
    }
}
