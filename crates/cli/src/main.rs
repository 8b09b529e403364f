//! Parley CLI — the main entry point.
//!
//! Commands:
//! - `chat`    — Talk to the persona (default)
//! - `facts`   — Show the facts retrieved for a query
//! - `calc`    — Evaluate an arithmetic expression
//! - `config`  — Show, locate, create or validate the config file
//! - `doctor`  — Diagnose credentials, knowledge and backends

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::GlobalOpts;

#[derive(Parser)]
#[command(
    name = "parley",
    about = "Parley — chat with Captain Jack Sparrow, backed by a knowledge base",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.parley/config.toml
    #[arg(long, global = true, env = "PARLEY_CONFIG")]
    config: Option<PathBuf>,

    /// Knowledge file to use instead of the configured one
    #[arg(long, global = true)]
    knowledge: Option<PathBuf>,

    /// Never call the language model
    #[arg(long, global = true)]
    offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the persona (interactive unless --message is given)
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Print the facts most relevant to a query, with scores
    Facts {
        query: String,

        /// Number of facts to show
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Evaluate an arithmetic expression
    Calc { expression: String },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose system health
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (credentials redacted)
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file
    Init,
    /// Validate the configuration
    Validate,
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let opts = GlobalOpts {
        config: cli.config,
        knowledge: cli.knowledge,
        offline: cli.offline,
    };

    match cli.command.unwrap_or(Commands::Chat { message: None }) {
        Commands::Chat { message } => commands::chat::run(&opts, message).await?,
        Commands::Facts { query, k } => commands::facts::run(&opts, &query, k).await?,
        Commands::Calc { expression } => commands::calc::run(&expression)?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(&opts)?,
            ConfigAction::Path => commands::config_cmd::path(&opts)?,
            ConfigAction::Init => commands::config_cmd::init(&opts)?,
            ConfigAction::Validate => commands::config_cmd::validate(&opts)?,
        },
        Commands::Doctor => commands::doctor::run(&opts).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so the conversation on stdout stays clean
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("  ❌ {e}");
        std::process::exit(1);
    }
}
