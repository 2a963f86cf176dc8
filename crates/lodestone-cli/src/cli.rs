//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Lodestone CLI - Resolve players, their profiles and member metrics.
#[derive(Debug, Parser)]
#[command(name = "lodestone")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (defaults to ~/.lodestone/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Profile service API key
    #[arg(long, env = "LODESTONE_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Pretty-printed JSON (default)
    Json,
    /// Table format
    Table,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a player by name
    Player {
        /// Player name
        name: String,
    },

    /// Resolve a player by id (dashed or undashed)
    PlayerId {
        /// Identity id
        id: String,
    },

    /// List a player's profiles
    Profiles {
        /// Player name
        name: String,
    },

    /// Show a player's metrics within a profile
    Member {
        /// Player name
        name: String,
        /// Profile id
        profile_id: String,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Table => crate::config::OutputFormat::Table,
        }
    }
}
