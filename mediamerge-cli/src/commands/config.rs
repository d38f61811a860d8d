//! Configuration CLI commands.
//!
//! Provides `config show`, `config path` and `config check`.

use std::io::{self, Write};
use std::path::Path;

use clap::Subcommand;
use mediamerge::config::ConfigFile;

use super::common::{load_validated, resolve_config_path};
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the validated configuration as JSON
    Show,

    /// Show the configuration file path
    Path,

    /// Load and validate the configuration file
    Check,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    let mut out = io::stdout().lock();
    match command {
        ConfigCommands::Show => run_show(config_path, &mut out),
        ConfigCommands::Path => run_path(config_path, &mut out),
        ConfigCommands::Check => run_check(config_path, &mut out),
    }
}

fn run_show(config_path: Option<&Path>, out: &mut impl Write) -> Result<(), CliError> {
    let file = load_validated(config_path)?;
    write_json(&file, out)
}

fn write_json(file: &ConfigFile, out: &mut impl Write) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *out, file)?;
    writeln!(out).map_err(|e| CliError::Output(e.to_string()))
}

fn run_path(config_path: Option<&Path>, out: &mut impl Write) -> Result<(), CliError> {
    let path = resolve_config_path(config_path);
    writeln!(out, "{}", path.display()).map_err(|e| CliError::Output(e.to_string()))
}

fn run_check(config_path: Option<&Path>, out: &mut impl Write) -> Result<(), CliError> {
    let path = resolve_config_path(config_path);
    let file = load_validated(Some(&path))?;
    let config = file.merge_config();

    writeln!(
        out,
        "Configuration OK: {} ({} media type(s), tags: {})",
        path.display(),
        config.types.len(),
        config.quality_tags.join(", ")
    )
    .map_err(|e| CliError::Output(e.to_string()))
}
