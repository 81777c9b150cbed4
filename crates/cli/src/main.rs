//! sheetwise CLI — the main entry point.
//!
//! Commands:
//! - `serve`    — Start the HTTP gateway
//! - `ask`      — Answer one query and print the result envelope
//! - `classify` — Classify a query offline, optionally showing the prompt
//! - `doctor`   — Check credentials, spreadsheet, and model end to end
//! - `init`     — Write a default config file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "sheetwise",
    about = "sheetwise — spreadsheet-grounded question answering",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to $SHEETWISE_CONFIG or ~/.sheetwise/config.toml)
    #[arg(short, long, global = true, env = "SHEETWISE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Answer a single query
    Ask {
        /// The question to answer
        query: String,
    },

    /// Classify a query without calling any external service
    Classify {
        query: String,

        /// Also print the prompt that would be sent to the model
        #[arg(long)]
        compose: bool,
    },

    /// Diagnose credentials and connectivity
    Doctor,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenv::dotenv();

    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { host, port } => commands::serve::run(config_path, host, port).await?,
        Commands::Ask { query } => commands::ask::run(config_path, &query).await?,
        Commands::Classify { query, compose } => {
            commands::classify::run(config_path, &query, compose)?
        }
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Init { force } => commands::init::run(config_path, force)?,
    }

    Ok(())
}
