//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod fetch;
mod helpers;
mod init;
mod serve;
mod sources;
mod stats;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "jobfeed")]
#[command(about = "Remote job postings aggregator")]
#[command(version)]
pub struct Cli {
    /// Target directory or database file (overrides config file).
    /// Can be a directory containing jobs.sqlite or a .sqlite file directly.
    #[arg(long, short = 't', global = true)]
    target: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from the current directory instead of the config file
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Fetch every enabled source into the database
    Fetch(FetchArgs),

    /// List the source registry
    Sources,

    /// Show database statistics
    Stats,

    /// Start the JSON API server
    Serve {
        /// Address to bind: port (3030), host (0.0.0.0), or host:port (0.0.0.0:3030)
        #[arg(default_value = "127.0.0.1:3030")]
        bind: String,
    },
}

/// Flags for the `fetch` command.
#[derive(Args, Debug, Default)]
pub struct FetchArgs {
    /// Only fetch these source ids (comma separated, case-insensitive)
    #[arg(long, value_delimiter = ',')]
    only: Vec<String>,

    /// Skip these source ids (comma separated, case-insensitive)
    #[arg(long, value_delimiter = ',')]
    skip: Vec<String>,

    /// Ignore the minimum interval between runs
    #[arg(long)]
    no_throttle: bool,

    /// Maximum postings accepted per source
    #[arg(long)]
    max_per_source: Option<usize>,

    /// Drop postings older than this many days
    #[arg(long)]
    since_days: Option<u32>,

    /// Print the source registry; exits afterwards unless --dry-run is given
    #[arg(long)]
    print_sources: bool,

    /// Fetch and map without writing to the database
    #[arg(long)]
    dry_run: bool,

    /// Keep postings that disappeared from a source's listing
    #[arg(long, conflicts_with = "prune")]
    no_prune: bool,

    /// Delete postings that disappeared from a source's listing
    #[arg(long)]
    prune: bool,

    /// Delete postings created more than this many days ago (0 disables)
    #[arg(long)]
    retention_days: Option<u32>,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
        target: cli.target,
    };
    let (settings, config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Fetch(args) => fetch::cmd_fetch(&settings, &config, args).await,
        Commands::Sources => sources::cmd_sources(&config),
        Commands::Stats => stats::cmd_stats(&settings, &config).await,
        Commands::Serve { bind } => serve::cmd_serve(&settings, &config, &bind).await,
    }
}
