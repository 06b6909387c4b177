//! Configuration management using the prefer crate for file discovery.
//!
//! Precedence, lowest first: built-in defaults, config file, environment
//! (`PINACQUIRE_*`), command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::discovery::{DiscoveryOptions, RecordExtractor, DEFAULT_PAGE_DELAY, DEFAULT_RESOLUTION_LADDER};
use crate::scrapers::Timeouts;
use crate::services::download::{DownloadConfig, DEFAULT_CONCURRENCY, DEFAULT_MIN_ASSET_SIZE};
use crate::utils::LadderTiers;

/// Name used for config file discovery.
pub const CONFIG_NAME: &str = "pinacquire";

pub const ENV_CONCURRENCY: &str = "PINACQUIRE_CONCURRENCY";
pub const ENV_USER_AGENT: &str = "PINACQUIRE_USER_AGENT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {format} config {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
    #[error("invalid setting {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Application settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// User agent config: `None` for the default browser agent,
    /// `"impersonate"` for a random one, anything else verbatim.
    pub user_agent: Option<String>,
    /// Overall request timeout in seconds.
    pub request_timeout: u64,
    /// Connect timeout in seconds.
    pub connect_timeout: u64,
    /// Read-stall timeout in seconds.
    pub read_timeout: u64,
    /// Delay between API pages in milliseconds.
    pub page_delay_ms: u64,
    /// Concurrent downloads.
    pub concurrency: usize,
    /// Assets must be larger than this many bytes.
    pub min_asset_size: u64,
    /// Image keys checked during extraction, best first.
    pub resolution_ladder: Vec<String>,
    pub ladder_tiers: LadderTiers,
    /// Stop paging after this many API pages.
    pub max_pages: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        let timeouts = Timeouts::default();
        Self {
            user_agent: None,
            request_timeout: timeouts.total.as_secs(),
            connect_timeout: timeouts.connect.as_secs(),
            read_timeout: timeouts.read.as_secs(),
            page_delay_ms: DEFAULT_PAGE_DELAY.as_millis() as u64,
            concurrency: DEFAULT_CONCURRENCY,
            min_asset_size: DEFAULT_MIN_ASSET_SIZE,
            resolution_ladder: DEFAULT_RESOLUTION_LADDER
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ladder_tiers: LadderTiers::default(),
            max_pages: None,
        }
    }
}

impl Settings {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            total: Duration::from_secs(self.request_timeout),
            connect: Duration::from_secs(self.connect_timeout),
            read: Duration::from_secs(self.read_timeout),
        }
    }

    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            page_delay: Duration::from_millis(self.page_delay_ms),
            max_pages: self.max_pages,
            extractor: RecordExtractor::new(self.resolution_ladder.clone()),
        }
    }

    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig {
            min_asset_size: self.min_asset_size,
            tiers: self.ladder_tiers.clone(),
        }
    }

    /// Apply `PINACQUIRE_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_CONCURRENCY) {
            match value.trim().parse::<usize>() {
                Ok(n) if n >= 1 => self.concurrency = n,
                _ => warn!("Ignoring {}={:?}: expected a positive integer", ENV_CONCURRENCY, value),
            }
        }
        if let Some(value) = lookup(ENV_USER_AGENT) {
            if !value.trim().is_empty() {
                self.user_agent = Some(value);
            }
        }
    }

    /// Check values that would make a run meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "concurrency",
                message: "must be at least 1".to_string(),
            });
        }
        if self.request_timeout == 0 {
            return Err(ConfigError::Invalid {
                key: "request_timeout",
                message: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// User agent string, or "impersonate".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Overall request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_timeout: Option<u64>,
    /// Delay between API pages in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_asset_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_ladder: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ladder_tiers: Option<LadderTiers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<usize>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers pinacquire config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load(CONFIG_NAME).await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            warn!("Ignoring config file: {}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let mut config = Self::parse(path, &contents)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_error = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };

        match ext {
            "toml" => toml::from_str(contents).map_err(|e| parse_error("TOML", e.to_string())),
            "yaml" | "yml" => {
                serde_yaml::from_str(contents).map_err(|e| parse_error("YAML", e.to_string()))
            }
            _ => serde_json::from_str(contents).map_err(|e| parse_error("JSON", e.to_string())),
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(timeout) = self.connect_timeout {
            settings.connect_timeout = timeout;
        }
        if let Some(timeout) = self.read_timeout {
            settings.read_timeout = timeout;
        }
        if let Some(delay) = self.page_delay_ms {
            settings.page_delay_ms = delay;
        }
        if let Some(concurrency) = self.concurrency {
            settings.concurrency = concurrency;
        }
        if let Some(size) = self.min_asset_size {
            settings.min_asset_size = size;
        }
        if let Some(ref ladder) = self.resolution_ladder {
            if !ladder.is_empty() {
                settings.resolution_ladder = ladder.clone();
            }
        }
        if let Some(ref tiers) = self.ladder_tiers {
            settings.ladder_tiers = tiers.clone();
        }
        if let Some(max) = self.max_pages {
            settings.max_pages = Some(max);
        }
    }
}

/// Resolve a user-supplied path, expanding a leading `~`.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

/// Load settings from an explicit config file, or from a discovered one,
/// then apply environment overrides.
pub async fn load_settings(config_path: Option<&Path>) -> Result<(Settings, Config), ConfigError> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };
    if let Some(path) = &config.source_path {
        debug!("Loaded config from {}", path.display());
    }

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    settings.apply_env(|key| std::env::var(key).ok());
    settings.validate()?;

    Ok((settings, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.concurrency, 12);
        assert_eq!(settings.min_asset_size, 5000);
        assert_eq!(settings.page_delay_ms, 400);
        assert_eq!(settings.timeouts(), Timeouts::default());
        assert_eq!(settings.resolution_ladder, vec!["736x", "474x", "236x", "orig"]);
        assert!(settings.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pinacquire.toml");
        std::fs::write(
            &path,
            r#"
concurrency = 4
page_delay_ms = 0
resolution_ladder = ["orig", "736x"]

[ladder_tiers]
original = "originals"
high = "564x"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings);

        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
        assert_eq!(settings.concurrency, 4);
        assert_eq!(settings.page_delay_ms, 0);
        assert_eq!(settings.resolution_ladder, vec!["orig", "736x"]);
        assert_eq!(settings.ladder_tiers.high, "564x");
        assert_eq!(settings.ladder_tiers.medium, "474x");
        assert_eq!(settings.request_timeout, 60);
    }

    #[tokio::test]
    async fn test_load_yaml_and_json() {
        let dir = tempdir().unwrap();
        let yaml = dir.path().join("pinacquire.yaml");
        std::fs::write(&yaml, "min_asset_size: 1000\nmax_pages: 3\n").unwrap();
        let json = dir.path().join("pinacquire.json");
        std::fs::write(&json, r#"{"user_agent": "impersonate"}"#).unwrap();

        let from_yaml = Config::load_from_path(&yaml).await.unwrap();
        assert_eq!(from_yaml.min_asset_size, Some(1000));
        assert_eq!(from_yaml.max_pages, Some(3));

        let from_json = Config::load_from_path(&json).await.unwrap();
        assert_eq!(from_json.user_agent.as_deref(), Some("impersonate"));
    }

    #[tokio::test]
    async fn test_load_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::load_from_path(&missing).await,
            Err(ConfigError::Read { .. })
        ));

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "concurrency = [").unwrap();
        assert!(matches!(
            Config::load_from_path(&broken).await,
            Err(ConfigError::Parse { format: "TOML", .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_CONCURRENCY, "3"),
            (ENV_USER_AGENT, "MyBot/2.0"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.concurrency, 3);
        assert_eq!(settings.user_agent.as_deref(), Some("MyBot/2.0"));
    }

    #[test]
    fn test_invalid_env_concurrency_is_ignored() {
        let mut settings = Settings::default();
        settings.apply_env(|key| (key == ENV_CONCURRENCY).then(|| "0".to_string()));
        assert_eq!(settings.concurrency, 12);
    }

    #[test]
    fn test_zero_concurrency_from_file_is_rejected() {
        let mut settings = Settings::default();
        Config {
            concurrency: Some(0),
            ..Default::default()
        }
        .apply_to_settings(&mut settings);
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Invalid { key: "concurrency", .. })
        ));
    }

    #[test]
    fn test_expand_path_tilde() {
        if std::env::var_os("HOME").is_some() {
            let expanded = expand_path(Path::new("~/pins"));
            assert!(!expanded.to_string_lossy().starts_with('~'));
            assert!(expanded.ends_with("pins"));
        }
        assert_eq!(expand_path(Path::new("/abs/dir")), PathBuf::from("/abs/dir"));
        assert_eq!(expand_path(Path::new("rel/~x")), PathBuf::from("rel/~x"));
    }
}
