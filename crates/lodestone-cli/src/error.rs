//! Error types for the CLI application.

use lodestone_resolver::{ConfigError, ResolveError};
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded, or the resolver could not start
    #[error(transparent)]
    Resolver(#[from] ConfigError),

    /// Resolution failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Output could not be rendered
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A command argument is malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
