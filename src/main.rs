mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use itemstash::config::Config;
use itemstash::observability;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    observability::init_tracing();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = cli.download_dir {
        config.store.download_dir = dir;
    }

    match cli.command {
        Commands::Ingest(args) => commands::ingest(&config, &args.input).await?,
        Commands::Status => commands::status(&config)?,
        Commands::Magnet(args) => commands::magnet(&args.url)?,
    }

    Ok(())
}
