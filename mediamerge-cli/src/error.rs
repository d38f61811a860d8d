//! CLI error type.

use std::fmt;
use std::process::ExitCode;

use mediamerge::config::ConfigError;
use mediamerge::logging::LoggingError;
use mediamerge::merge::MergeError;

/// Errors surfaced to the user by a CLI command.
#[derive(Debug)]
pub enum CliError {
    /// The configuration file could not be loaded.
    Config(ConfigError),
    /// The configuration loaded but failed validation.
    InvalidConfig(MergeError),
    /// The merge run failed.
    Merge(MergeError),
    /// Logging could not be initialized.
    Logging(LoggingError),
    /// Output could not be produced.
    Output(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::FAILURE
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidConfig(e) => write!(f, "Invalid configuration: {}", e),
            CliError::Merge(e) => write!(f, "Merge failed: {}", e),
            CliError::Logging(e) => write!(f, "Logging setup failed: {}", e),
            CliError::Output(msg) => write!(f, "Output error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::InvalidConfig(e) | CliError::Merge(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Output(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<MergeError> for CliError {
    fn from(e: MergeError) -> Self {
        CliError::Merge(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e.to_string())
    }
}
