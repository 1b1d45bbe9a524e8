//! txstore CLI
//!
//! Console front end for the transactional key-value store.
//!
//! # Commands
//!
//! - `shell` - Read commands from stdin (default)
//! - `run` - Execute a script file of commands
//! - `version` - Show version information

mod command;
mod commands;
mod console;
mod session;

use clap::{Parser, Subcommand};
use console::OutputFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use txstore_core::{EngineConfig, StoreEngine};

/// Transactional key-value store console.
#[derive(Parser)]
#[command(name = "txstore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Number of engine worker threads
    #[arg(global = true, short, long)]
    workers: Option<usize>,

    /// Output format
    #[arg(global = true, short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read commands from stdin, one per line
    Shell,

    /// Execute a script file of commands
    Run {
        /// Script to execute
        file: PathBuf,

        /// Abort at the first failed command
        #[arg(long)]
        stop_on_error: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG overrides the default level
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = EngineConfig::new();
    if let Some(workers) = cli.workers {
        config = config.worker_threads(workers);
    }

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            commands::shell::run(StoreEngine::new(config), cli.format)?;
        }
        Commands::Run {
            file,
            stop_on_error,
        } => {
            commands::script::run(&file, StoreEngine::new(config), cli.format, stop_on_error)?;
        }
        Commands::Version => {
            println!("txstore CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("txstore core v{}", txstore_core::VERSION);
        }
    }

    Ok(())
}
