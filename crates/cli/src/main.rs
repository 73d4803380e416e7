//! Askbase CLI
//!
//! Answers questions over a managed knowledge base: the question is expanded
//! into several search queries, excerpts are retrieved for each, optionally
//! judged for relevance, and an answer is generated from what remains.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, CheckCommand, ExpandCommand, RetrieveCommand};
use askbase_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;
use std::process::ExitCode;

/// Askbase - question answering over a knowledge base
#[derive(Parser, Debug)]
#[command(name = "askbase")]
#[command(about = "Question answering over a knowledge base with query expansion", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "ASKBASE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file (default: .askbase/config.yaml)
    #[arg(short, long, global = true, env = "ASKBASE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (ollama, claude, bedrock)
    #[arg(short, long, global = true, env = "ASKBASE_PROVIDER")]
    provider: Option<String>,

    /// Model identifier (overrides model_id in config_llm.yaml)
    #[arg(short, long, global = true, env = "ASKBASE_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a question with the full pipeline
    Ask(AskCommand),

    /// Expand a question into search queries
    Expand(ExpandCommand),

    /// Query the knowledge base directly
    Retrieve(RetrieveCommand),

    /// Validate configuration without contacting any service
    Check(CheckCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(kind = e.kind(), "Command failed: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    // Workspace and config file decide which config.yaml is read
    let config = AppConfig::load_with(cli.workspace, cli.config)?.with_overrides(
        None,
        None,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Askbase CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.llm.provider);

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Expand(_) => "expand",
        Commands::Retrieve(_) => "retrieve",
        Commands::Check(_) => "check",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Expand(cmd) => cmd.execute(&config).await,
        Commands::Retrieve(cmd) => cmd.execute(&config).await,
        Commands::Check(cmd) => cmd.execute(&config).await,
    };

    if result.is_ok() {
        tracing::info!("Command completed successfully");
    }

    result
}
