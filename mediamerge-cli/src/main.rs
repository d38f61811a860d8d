//! MediaMerge CLI - Command-line interface
//!
//! Triggers merge runs and inspects the configuration.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use mediamerge::logging::{init_logging, LoggingOptions};

use commands::config::ConfigCommands;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "mediamerge")]
#[command(version = mediamerge::VERSION)]
#[command(about = "Merge quality-tiered media trees into one hard-linked library", long_about = None)]
struct Cli {
    /// Configuration file (defaults to $MEDIAMERGE_CONFIG or the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Merge every configured media type
    Merge {
        /// Do not ask the media server to rescan afterwards
        #[arg(long)]
        no_notify: bool,
    },

    /// Inspect the configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut options = LoggingOptions::new().with_verbose(cli.verbose);
    if let Some(path) = &cli.log_file {
        options = options.with_log_file(path.clone());
    }
    let _guard = init_logging(&options)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Merge { no_notify } => commands::merge::run(config_path, no_notify),
        Commands::Config(command) => commands::config::run(command, config_path),
    }
}
