//! Engine and CLI configuration.
//!
//! The engine takes an explicit [`ScanConfig`] at construction time and never
//! reads ambient state, which keeps the core testable in isolation. The CLI
//! additionally loads persisted defaults from a TOML file.
//!
//! # Configuration Location
//!
//! The CLI configuration file is stored at:
//! - Linux: `~/.config/depscan/config.toml`
//! - macOS: `~/Library/Application Support/depscan/config.toml`
//! - Windows: `%APPDATA%\depscan\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! ecosystem = "npm"
//! concurrency = 3
//! timeout_secs = 30
//! max_retries = 2
//! default_format = "table"
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration passed into the scan engine.
///
/// # Example
///
/// ```
/// use depscan::ScanConfig;
///
/// let config = ScanConfig {
///     ecosystem: "PyPI".to_string(),
///     ..ScanConfig::default()
/// };
/// assert_eq!(config.concurrency, 3);
/// ```
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Package-registry namespace queried and matched against (e.g., "npm").
    pub ecosystem: String,

    /// Maximum simultaneous in-flight advisory queries.
    pub concurrency: usize,

    /// Per-query timeout; a timed-out query counts as a retryable failure.
    pub timeout: Duration,

    /// Additional attempts after the first failure of a query.
    pub max_retries: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ecosystem: "npm".to_string(),
            concurrency: 3,
            timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }
}

/// Persisted CLI defaults.
///
/// Loaded from a TOML file or created with default values; every field can
/// be overridden by a command-line flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ecosystem to scan against when no `--ecosystem` flag is provided.
    pub ecosystem: String,

    /// Concurrency limit for advisory queries.
    pub concurrency: usize,

    /// Per-query timeout, in seconds.
    pub timeout_secs: u64,

    /// Additional retry attempts after a failed query.
    pub max_retries: u32,

    /// Default output format when no `--format` flag is provided.
    ///
    /// Valid values: "table", "json"
    pub default_format: String,
}

impl Default for Config {
    fn default() -> Self {
        let scan = ScanConfig::default();
        Self {
            ecosystem: scan.ecosystem,
            concurrency: scan.concurrency,
            timeout_secs: scan.timeout.as_secs(),
            max_retries: scan.max_retries,
            default_format: "table".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from the default config file location.
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration to the default config file location,
    /// creating the parent directory if needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Saves the configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("depscan")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }

    /// Converts the file config into the engine's explicit configuration.
    pub fn to_scan_config(&self) -> ScanConfig {
        ScanConfig {
            ecosystem: self.ecosystem.clone(),
            concurrency: self.concurrency,
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
        }
    }
}
