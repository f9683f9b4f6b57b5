//! Storybooker CLI binary.
//!
//! - Serve the HTTP job API
//! - Run a single storybook job in-process
//! - Inspect stored characters

use clap::Parser;
use storybooker::StorybookerConfig;
use storybooker::observability::{ObservabilityConfig, init_observability};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use cli::{Cli, Commands, handle_character_command, run_generate, run_server};

    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = StorybookerConfig::load()?;

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    let logging = ObservabilityConfig::new(level).with_json_logs(cli.json_logs || config.logging.json);
    init_observability(&logging).map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    match cli.command {
        Commands::Serve { addr } => run_server(&config, addr).await?,
        Commands::Generate(args) => run_generate(&config, args).await?,
        Commands::Characters(command) => handle_character_command(&config, command).await?,
    }

    Ok(())
}
