//! CLI definitions and dispatch.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "scrape-relay")]
#[command(about = "Headless-browser relay for listing extraction")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (discovered automatically when omitted)
    #[arg(long, global = true, env = "SCRAPE_RELAY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP relay (default)
    Serve {
        /// Listen host (overrides HOST)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run one job from a JSON file and print the result
    Scrape {
        /// Job description, same shape as the POST /scrape body
        job: PathBuf,
    },

    /// List supported source identifiers
    Sources,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => commands::cmd_serve(cli.config.as_deref(), None, None).await,
        Some(Commands::Serve { host, port }) => {
            commands::cmd_serve(cli.config.as_deref(), host, port).await
        }
        Some(Commands::Scrape { job }) => commands::cmd_scrape(cli.config.as_deref(), &job).await,
        Some(Commands::Sources) => commands::cmd_sources(),
    }
}
