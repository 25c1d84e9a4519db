use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "itemstash")]
#[command(about = "Persist discovered items as numbered artifact directories", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to $ITEMSTASH_CONFIG or config/itemstash.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override store.download_dir
    #[arg(long, global = true)]
    pub download_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run candidates from a JSON Lines file through the pipeline
    Ingest(IngestArgs),
    /// Show the next id and committed row count of the store
    Status,
    /// Print the magnet URI derived from a hash link
    Magnet(MagnetArgs),
}

#[derive(clap::Args, Debug)]
pub struct IngestArgs {
    /// JSON Lines input, or `-` for stdin
    #[arg(long, short, default_value = "-")]
    pub input: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct MagnetArgs {
    /// Link carrying a `hash` value
    pub url: String,
}
