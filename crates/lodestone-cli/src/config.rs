//! Configuration management for the CLI.
//!
//! One TOML file holds both the resolver settings and an optional
//! `[output]` table for the CLI itself:
//!
//! ```toml
//! [upstream]
//! api_key = "..."
//!
//! [output]
//! format = "table"
//! color = false
//! ```

use crate::error::Result;
use lodestone_resolver::{ConfigError, ResolverConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Resolver settings
    pub resolver: ResolverConfig,

    /// Output settings
    pub settings: Settings,
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// Table format
    Table,
}

#[derive(Debug, Default, Deserialize)]
struct OutputSection {
    #[serde(default)]
    output: Settings,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ConfigError::Invalid("could not find home directory".into()))?;
        Ok(home.join(".lodestone").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. The default path is optional; when it
    /// is absent every setting takes its default.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Self::path()?;
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(ConfigError::FileRead)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let resolver = ResolverConfig::from_toml_str(contents)?;
        let section: OutputSection = toml::from_str(contents).map_err(ConfigError::TomlParse)?;
        Ok(Self {
            resolver,
            settings: section.output,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Json,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Json
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.settings.color);
        assert_eq!(config.settings.format, OutputFormat::Json);
        assert_eq!(config.resolver, ResolverConfig::default());
    }

    #[test]
    fn test_parse_shared_file() {
        let config = Config::from_toml_str(
            r#"
            [upstream]
            timeout_secs = 4

            [output]
            format = "table"
            "#,
        )
        .unwrap();

        assert_eq!(config.resolver.timeout(), Duration::from_secs(4));
        assert_eq!(config.settings.format, OutputFormat::Table);
        assert!(config.settings.color);
    }

    #[test]
    fn test_invalid_resolver_section() {
        let err = Config::from_toml_str("[upstream]\ntimeout_secs = 0").unwrap_err();
        assert!(matches!(err, CliError::Resolver(_)));
    }

    #[test]
    fn test_malformed_output_section() {
        let err = Config::from_toml_str("[output]\nformat = \"yaml\"").unwrap_err();
        assert!(matches!(err, CliError::Resolver(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load(Some(&missing)).unwrap_err(),
            CliError::Resolver(ConfigError::FileRead(_))
        ));

        let present = dir.path().join("config.toml");
        fs::write(&present, "[output]\ncolor = false\n").unwrap();
        let config = Config::load(Some(&present)).unwrap();
        assert!(!config.settings.color);
    }
}
