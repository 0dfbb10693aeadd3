use anyhow::Result;
use clap::Parser;

use repowatch::Settings;
use repowatch::cli::commands::{check, init, watch};
use repowatch::cli::{Cli, Commands};
use repowatch::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command.clone().unwrap_or(Commands::Watch) {
        Commands::Init { force } => init::run_init(&std::env::current_dir()?, force),
        Commands::Config => init::run_config(&Settings::load(config_path)?),
        Commands::Check => check::run(&Settings::load(config_path)?),
        Commands::Watch => {
            let settings = Settings::load(config_path)?;
            logging::init_with_config(&settings.logging, Some(&settings.log_dir));
            watch::run(&settings).await
        }
    }
}
