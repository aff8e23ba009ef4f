//! KB Search CLI
//!
//! Main entry point for the kbsearch command-line tool.
//! Queries an external knowledge base (RAG) service and prints the
//! synthesized answer together with its source messages.

mod commands;

use clap::{Parser, Subcommand};
use commands::{ConfigCommand, SearchCommand, ToolCommand};
use kbsearch_core::{config::keys, logging, AppConfig, AppResult};
use std::path::PathBuf;

/// KB Search CLI - query a knowledge base search service
#[derive(Parser, Debug)]
#[command(name = "kbsearch")]
#[command(about = "Query a knowledge base search service", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "KBSEARCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Search service endpoint URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Per-attempt timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Total attempt budget
    #[arg(long, global = true)]
    max_retries: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search the knowledge base
    Search(SearchCommand),

    /// Run the chat tool handler with JSON arguments
    Tool(ToolCommand),

    /// Show the resolved client configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::load_with(Some(path), |key| std::env::var(key).ok())?,
        None => AppConfig::load()?,
    };

    // Flags override environment and config file
    let config = config.with_overrides(
        cli.log_level,
        cli.verbose,
        cli.no_color,
        &[
            (keys::ENDPOINT_URL, cli.endpoint),
            (keys::TIMEOUT, cli.timeout_ms.map(|v| v.to_string())),
            (keys::MAX_RETRIES, cli.max_retries.map(|v| v.to_string())),
        ],
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_format)?;

    tracing::info!("KB Search CLI starting");
    tracing::debug!("Config file: {:?}", config.config_file);

    let command_name = match &cli.command {
        Commands::Search(_) => "search",
        Commands::Tool(_) => "tool",
        Commands::Config(_) => "config",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Tool(cmd) => cmd.execute(&config).await,
        Commands::Config(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
