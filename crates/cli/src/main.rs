//! Science Tutor CLI
//!
//! Main entry point for the `tutor` command-line tool.
//! Answers questions about a textbook using a local retrieval-augmented pipeline.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, HistoryCommand, IndexCommand, ServeCommand};
use std::path::PathBuf;
use tracing::Instrument;
use tutor_core::config::{AppConfig, ConfigOverrides};
use tutor_core::{logging, AppResult};

/// Science Tutor - ask questions about your textbook
#[derive(Parser, Debug)]
#[command(name = "tutor")]
#[command(about = "Ask questions about a science textbook, answered by a local LLM", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Source document (PDF or form-feed separated text)
    #[arg(long, global = true)]
    pdf: Option<PathBuf>,

    /// Generation model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Embedding provider (ollama, mock)
    #[arg(long, global = true)]
    embedding_provider: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web front end
    Serve(ServeCommand),

    /// Ask a single question
    Ask(AskCommand),

    /// Build or inspect the vector index
    Index(IndexCommand),

    /// Show recent questions and answers
    History(HistoryCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from the config file and environment
    let config = AppConfig::load_with(cli.workspace.clone(), cli.config.clone())?;

    // Apply CLI overrides
    let config = config.with_overrides(ConfigOverrides {
        workspace: cli.workspace,
        config_file: cli.config,
        pdf_path: cli.pdf,
        model: cli.model,
        embedding_provider: cli.embedding_provider,
        log_level: cli.log_level,
        verbose: cli.verbose,
        no_color: cli.no_color,
    });

    // Initialize logging with final configuration
    logging::init_logging(
        config.log_level.as_deref(),
        config.no_color,
        Some(&config.log_path()),
    )?;

    tracing::info!("Science tutor starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Source: {:?}", config.source_path());
    tracing::debug!("Model: {} via {}", config.model, config.provider);

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Ask(_) => "ask",
        Commands::Index(_) => "index",
        Commands::History(_) => "history",
    };
    let span = tracing::info_span!("command", name = command_name);

    // Route to command handlers
    let result = async {
        match cli.command {
            Commands::Serve(cmd) => cmd.execute(config).await,
            Commands::Ask(cmd) => cmd.execute(config).await,
            Commands::Index(cmd) => cmd.execute(config).await,
            Commands::History(cmd) => cmd.execute(&config),
        }
    }
    .instrument(span)
    .await;

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
