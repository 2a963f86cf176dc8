//! Configuration file parsing for the resolvers.
//!
//! Loads upstream endpoints, the store location and per-cache TTL
//! overrides from TOML. Every field is optional:
//!
//! ```toml
//! [upstream]
//! identity_url = "https://api.minecraftservices.com/minecraft/profile"
//! profile_url = "https://api.hypixel.net/v2/skyblock"
//! api_key = "..."            # falls back to LODESTONE_API_KEY
//! timeout_secs = 10
//!
//! [store]
//! path = "/var/lib/lodestone/lodestone.db"
//!
//! [cache.profile_details]
//! ttl_secs = 3600
//! failure_ttl_secs = 300
//! sweep_interval_secs = 0    # disables sweeping
//! ```

use lodestone_cache::CacheConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "LODESTONE_API_KEY";

/// Resolver configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A field holds a value the resolvers cannot work with
    #[error("Invalid configuration value: {0}")]
    Invalid(String),

    /// The entry store could not be opened
    #[error("Failed to open store: {0}")]
    Store(String),

    /// An upstream client could not be built
    #[error("Failed to build upstream client: {0}")]
    Upstream(String),
}

/// Resolver configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Upstream endpoints and credentials
    pub upstream: UpstreamConfig,

    /// Entry store location
    pub store: StoreConfig,

    /// Per-cache overrides
    pub cache: CacheSection,
}

/// Upstream settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Identity service base URL
    pub identity_url: String,

    /// Profile service base URL
    pub profile_url: String,

    /// Profile service API key
    pub api_key: Option<String>,

    /// Timeout applied to every upstream call
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            identity_url: lodestone_upstream::identity::DEFAULT_ENDPOINT.to_string(),
            profile_url: lodestone_upstream::profile::DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            timeout_secs: lodestone_upstream::profile::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Entry store settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database path; in-memory when absent
    pub path: Option<PathBuf>,
}

/// Overrides for the three cache instances
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Identity cache
    pub identities: CacheOverrides,

    /// Profile-list cache
    pub profile_lists: CacheOverrides,

    /// Profile-document cache
    pub profile_details: CacheOverrides,
}

/// Optional overrides applied on top of a cache preset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOverrides {
    /// Success TTL in seconds
    pub ttl_secs: Option<u64>,

    /// Failure TTL in seconds
    pub failure_ttl_secs: Option<u64>,

    /// Sweep interval in seconds; 0 disables sweeping
    pub sweep_interval_secs: Option<u64>,
}

impl CacheOverrides {
    /// Apply these overrides to a preset
    pub fn apply(&self, mut preset: CacheConfig) -> CacheConfig {
        if let Some(ttl) = self.ttl_secs {
            preset.default_ttl = Duration::from_secs(ttl);
        }
        if let Some(ttl) = self.failure_ttl_secs {
            preset.failure_ttl = Duration::from_secs(ttl);
        }
        match self.sweep_interval_secs {
            Some(0) => preset.sweep_interval = None,
            Some(secs) => preset.sweep_interval = Some(Duration::from_secs(secs)),
            None => {}
        }
        preset
    }
}

impl ResolverConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ResolverConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "upstream.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.upstream.identity_url.is_empty() {
            return Err(ConfigError::Invalid("upstream.identity_url is empty".to_string()));
        }
        if self.upstream.profile_url.is_empty() {
            return Err(ConfigError::Invalid("upstream.profile_url is empty".to_string()));
        }
        Ok(())
    }

    /// Upstream timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.timeout_secs)
    }

    /// Configured API key, falling back to [`API_KEY_ENV`]
    pub fn api_key(&self) -> Option<String> {
        self.upstream
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Identity cache configuration
    pub fn identities_cache(&self) -> CacheConfig {
        self.cache.identities.apply(CacheConfig::identities())
    }

    /// Profile-list cache configuration
    pub fn profile_lists_cache(&self) -> CacheConfig {
        self.cache.profile_lists.apply(CacheConfig::profile_lists())
    }

    /// Profile-document cache configuration
    pub fn profile_details_cache(&self) -> CacheConfig {
        self.cache.profile_details.apply(CacheConfig::profile_details())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ResolverConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.store.path, None);
        assert_eq!(config.identities_cache(), CacheConfig::identities());
        assert_eq!(config.profile_lists_cache(), CacheConfig::profile_lists());
        assert_eq!(config.profile_details_cache(), CacheConfig::profile_details());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = ResolverConfig::from_toml_str("").unwrap();
        assert_eq!(config, ResolverConfig::default());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [upstream]
            identity_url = "http://localhost:9001"
            api_key = "abc"
            timeout_secs = 3

            [store]
            path = "/tmp/lodestone.db"

            [cache.profile_details]
            ttl_secs = 60
            sweep_interval_secs = 0

            [cache.identities]
            failure_ttl_secs = 30
        "#;

        let config = ResolverConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.upstream.identity_url, "http://localhost:9001");
        assert_eq!(
            config.upstream.profile_url,
            lodestone_upstream::profile::DEFAULT_ENDPOINT
        );
        assert_eq!(config.api_key(), Some("abc".to_string()));
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.store.path, Some(PathBuf::from("/tmp/lodestone.db")));

        let details = config.profile_details_cache();
        assert_eq!(details.default_ttl, Duration::from_secs(60));
        assert_eq!(details.failure_ttl, CacheConfig::profile_details().failure_ttl);
        assert_eq!(details.sweep_interval, None);

        let identities = config.identities_cache();
        assert_eq!(identities.failure_ttl, Duration::from_secs(30));
        assert_eq!(identities.default_ttl, Duration::from_secs(3_600));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = ResolverConfig::from_toml_str("[upstream]\ntimeout_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_bad_toml() {
        let err = ResolverConfig::from_toml_str("[upstream\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ResolverConfig::from_file("/nonexistent/lodestone.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[upstream]\ntimeout_secs = 7\n").unwrap();

        let config = ResolverConfig::from_file(&path).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(7));
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let mut config = ResolverConfig::default();
        config.upstream.api_key = Some("   ".to_string());
        // A blank configured key wins over the environment and is then dropped
        assert_eq!(config.api_key(), None);
    }
}
