//! Configuration management for planboard
//!
//! This module handles loading, parsing, and validation of configuration
//! files.

use crate::constants::{CONFIG_GENERATED, RETRY_ATTEMPTS_MAX, RETRY_ATTEMPTS_MIN, RETRY_BACKOFF_MAX_MS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub remote: RemoteConfig,
    pub logging: LoggingConfig,
}

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Whether background sync starts enabled on a fresh cache. The
    /// runtime flag itself is persisted in local storage.
    pub enabled_by_default: bool,
    /// Attempts per outbox job before giving up.
    pub retry_max_attempts: u32,
    /// Base backoff between attempts, in milliseconds.
    pub retry_backoff_ms: u64,
}

/// Remote store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the remote store API.
    pub base_url: String,
    /// Environment variable holding the session bearer token.
    pub api_token_env: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Log level: error, warn, info, debug or trace
    pub level: String,
    /// Optional log file; stderr when unset
    pub file: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled_by_default: false,
            retry_max_attempts: crate::constants::SYNC_RETRY_MAX_ATTEMPTS,
            retry_backoff_ms: crate::constants::SYNC_RETRY_BACKOFF_MS,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.planboard.dev/v1".to_string(),
            api_token_env: "PLANBOARD_API_TOKEN".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
            file: None,
        }
    }
}

impl SyncConfig {
    /// The outbox retry policy this configuration describes.
    pub fn retry_policy(&self) -> crate::sync::RetryPolicy {
        crate::sync::RetryPolicy {
            max_attempts: self.retry_max_attempts,
            backoff: std::time::Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Result<Option<PathBuf>> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from("planboard.toml");
        if current_dir_config.exists() {
            return Ok(Some(current_dir_config));
        }

        // 2. Check XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("planboard").join("config.toml");
            if xdg_config.exists() {
                return Ok(Some(xdg_config));
            }
        }

        Ok(None)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.sync.retry_max_attempts < RETRY_ATTEMPTS_MIN
            || self.sync.retry_max_attempts > RETRY_ATTEMPTS_MAX
        {
            anyhow::bail!(
                "retry_max_attempts must be between {} and {}, got {}",
                RETRY_ATTEMPTS_MIN,
                RETRY_ATTEMPTS_MAX,
                self.sync.retry_max_attempts
            );
        }

        if self.sync.retry_backoff_ms > RETRY_BACKOFF_MAX_MS {
            anyhow::bail!(
                "retry_backoff_ms cannot exceed {} ({} given)",
                RETRY_BACKOFF_MAX_MS,
                self.sync.retry_backoff_ms
            );
        }

        if self.remote.base_url.is_empty() {
            anyhow::bail!("remote.base_url cannot be empty");
        }
        if !self.remote.base_url.starts_with("http://") && !self.remote.base_url.starts_with("https://") {
            anyhow::bail!("remote.base_url must be an http(s) URL, got '{}'", self.remote.base_url);
        }

        if self.remote.api_token_env.is_empty() {
            anyhow::bail!("remote.api_token_env cannot be empty");
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "logging.level must be one of {}, got '{}'",
                valid_levels.join(", "),
                self.logging.level
            );
        }

        Ok(())
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        // Add header comment
        let header = format!(
            "# Planboard Configuration File\n# Generated on {}\n\n",
            chrono::Local::now().format("%Y-%m-%d")
        );

        let full_content = header + &toml_content;

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        println!("{}: {}", CONFIG_GENERATED, path.as_ref().display());
        Ok(())
    }

    /// Get the XDG config directory path
    pub fn get_xdg_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join("planboard"))
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        Ok(Self::get_xdg_config_dir()?.join("config.toml"))
    }
}
