//! Cache configuration management with precedence and validation
//!
//! Precedence, lowest to highest: defaults, the JSON config file under the
//! XDG config directory, `COALESCE_CACHE*` environment variables, and finally
//! whatever the caller sets through [`CacheConfigBuilder`].

use crate::errors::{CacheError, Result};
use crate::mode::CacheMode;
use coalesce_utils::xdg::XdgPaths;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Keys longer than this are rejected unless configured otherwise
pub const DEFAULT_MAX_KEY_LENGTH: usize = 1024;

pub const ENV_MODE: &str = "COALESCE_CACHE";
pub const ENV_DEFAULT_TTL_MS: &str = "COALESCE_CACHE_DEFAULT_TTL_MS";
pub const ENV_CLEANUP_INTERVAL_MS: &str = "COALESCE_CACHE_CLEANUP_INTERVAL_MS";
pub const ENV_MAX_KEY_LENGTH: &str = "COALESCE_CACHE_MAX_KEY_LENGTH";
pub const ENV_KEY_PREFIX: &str = "COALESCE_CACHE_KEY_PREFIX";

/// Service-wide cache configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Whether the provider is read and/or written
    pub mode: CacheMode,
    /// TTL applied when a call does not supply one
    pub default_ttl: Option<Duration>,
    /// Interval of the in-memory expiry sweeper; zero disables it
    pub cleanup_interval: Duration,
    /// Upper bound on key length in bytes
    pub max_key_length: usize,
    /// Prefix for keys derived by `CachedFn`
    pub key_prefix: Option<String>,
    /// Where the last override came from
    pub source: ConfigSource,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            mode: CacheMode::ReadWrite,
            default_ttl: None,
            cleanup_interval: Duration::ZERO,
            max_key_length: DEFAULT_MAX_KEY_LENGTH,
            key_prefix: None,
            source: ConfigSource::Default,
        }
    }
}

impl CacheConfig {
    /// Check invariants that per-call validation relies on
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err(CacheError::configuration(
                "default_ttl must be greater than zero",
            ));
        }
        if self.max_key_length == 0 {
            return Err(CacheError::configuration(
                "max_key_length must be greater than zero",
            ));
        }
        if self.key_prefix.as_deref() == Some("") {
            return Err(CacheError::configuration("key_prefix must not be empty"));
        }
        Ok(())
    }
}

/// Source of configuration for debugging and precedence tracking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Default configuration
    Default,
    /// Configuration file
    ConfigFile(PathBuf),
    /// Environment variable
    EnvironmentVariable(String),
    /// Set programmatically
    Explicit,
}

/// Builder for creating cache configurations
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already loaded configuration
    pub fn from_config(config: CacheConfig) -> Self {
        Self { config }
    }

    pub fn with_mode(mut self, mode: CacheMode) -> Self {
        self.config.mode = mode;
        self.config.source = ConfigSource::Explicit;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.config.default_ttl = Some(ttl);
        self.config.source = ConfigSource::Explicit;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.config.cleanup_interval = interval;
        self.config.source = ConfigSource::Explicit;
        self
    }

    pub fn with_max_key_length(mut self, max: usize) -> Self {
        self.config.max_key_length = max;
        self.config.source = ConfigSource::Explicit;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.key_prefix = Some(prefix.into());
        self.config.source = ConfigSource::Explicit;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<CacheConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// On-disk shape: `{"cache": {...}}`
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    cache: FileCacheSection,
}

#[derive(Debug, Default, Deserialize)]
struct FileCacheSection {
    mode: Option<String>,
    default_ttl_ms: Option<u64>,
    cleanup_interval_ms: Option<u64>,
    max_key_length: Option<usize>,
    key_prefix: Option<String>,
}

/// Partial configuration produced by one source
#[derive(Debug, Default)]
struct ConfigOverrides {
    mode: Option<CacheMode>,
    default_ttl: Option<Duration>,
    cleanup_interval: Option<Duration>,
    max_key_length: Option<usize>,
    key_prefix: Option<String>,
}

impl ConfigOverrides {
    fn is_empty(&self) -> bool {
        self.mode.is_none()
            && self.default_ttl.is_none()
            && self.cleanup_interval.is_none()
            && self.max_key_length.is_none()
            && self.key_prefix.is_none()
    }

    fn apply(self, config: &mut CacheConfig, source: ConfigSource) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(ttl) = self.default_ttl {
            config.default_ttl = Some(ttl);
        }
        if let Some(interval) = self.cleanup_interval {
            config.cleanup_interval = interval;
        }
        if let Some(max) = self.max_key_length {
            config.max_key_length = max;
        }
        if let Some(prefix) = self.key_prefix {
            config.key_prefix = Some(prefix);
        }
        config.source = source;
    }
}

/// Configuration loader that handles precedence
pub struct CacheConfigLoader;

impl CacheConfigLoader {
    /// Load configuration with full precedence handling
    pub fn load() -> Result<CacheConfig> {
        Self::load_with_file(&Self::config_file_path())
    }

    /// Same as [`load`](Self::load) but with an explicit config file path
    pub fn load_with_file(path: &Path) -> Result<CacheConfig> {
        let mut config = CacheConfig::default();

        if let Some(overrides) = Self::load_from_file(path)? {
            overrides.apply(&mut config, ConfigSource::ConfigFile(path.to_path_buf()));
        }

        let env = Self::load_from_env()?;
        if !env.is_empty() {
            env.apply(
                &mut config,
                ConfigSource::EnvironmentVariable(format!("{ENV_MODE}*")),
            );
        }

        config.validate()?;
        tracing::debug!(source = ?config.source, mode = %config.mode, "Loaded cache configuration");
        Ok(config)
    }

    /// Default config file location
    pub fn config_file_path() -> PathBuf {
        XdgPaths::config_file()
    }

    fn load_from_file(path: &Path) -> Result<Option<ConfigOverrides>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file: ConfigFile = serde_json::from_str(&content).map_err(|e| {
            CacheError::configuration(format!(
                "invalid config file '{}': {e}",
                path.display()
            ))
        })?;

        let section = file.cache;
        Ok(Some(ConfigOverrides {
            mode: section.mode.map(CacheMode::from),
            default_ttl: section.default_ttl_ms.map(Duration::from_millis),
            cleanup_interval: section.cleanup_interval_ms.map(Duration::from_millis),
            max_key_length: section.max_key_length,
            key_prefix: section.key_prefix,
        }))
    }

    fn load_from_env() -> Result<ConfigOverrides> {
        Ok(ConfigOverrides {
            mode: std::env::var(ENV_MODE).ok().map(CacheMode::from),
            default_ttl: env_number::<u64>(ENV_DEFAULT_TTL_MS)?.map(Duration::from_millis),
            cleanup_interval: env_number::<u64>(ENV_CLEANUP_INTERVAL_MS)?
                .map(Duration::from_millis),
            max_key_length: env_number::<usize>(ENV_MAX_KEY_LENGTH)?,
            key_prefix: std::env::var(ENV_KEY_PREFIX).ok(),
        })
    }
}

/// Parse a numeric environment variable, failing fast on garbage
fn env_number<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            CacheError::configuration(format!("{name} must be a non-negative integer, got '{raw}'"))
        }),
        Err(_) => Ok(None),
    }
}
