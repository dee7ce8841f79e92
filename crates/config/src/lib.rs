#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for the DRS client
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/drs/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

use drs_errors::{ConfigError, Error};
use drs_hash::ChecksumAlgorithm;
use drs_types::AuthHeaders;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Size of the download worker pool
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
    /// Retries after the first attempt for transient failures
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_max_retry_delay")]
    pub max_retry_delay: u64, // seconds
    #[serde(default)]
    pub suppress_ssl_verify: bool,
}

/// Download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    pub output_dir: Option<PathBuf>,
    /// Preferred checksum algorithm, e.g. `sha-256`
    pub checksum: Option<String>,
    #[serde(default = "default_chunk_timeout")]
    pub chunk_timeout: u64, // seconds
}

/// Credentials sent with every request
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    pub token: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

// Default implementations

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_delay: default_max_retry_delay(),
            suppress_ssl_verify: false,
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            checksum: None,
            chunk_timeout: default_chunk_timeout(),
        }
    }
}

// Default value functions for serde
fn default_workers() -> usize {
    4
}

fn default_timeout() -> u64 {
    300 // 5 minutes
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_max_retry_delay() -> u64 {
    30
}

fn default_chunk_timeout() -> u64 {
    30
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("drs").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let Ok(config_path) = Self::default_path() else {
            return Ok(Self::default());
        };

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // DRS_WORKERS
        if let Ok(workers) = std::env::var("DRS_WORKERS") {
            self.general.workers = workers.parse().map_err(|_| ConfigError::InvalidValue {
                field: "DRS_WORKERS".to_string(),
                value: workers,
            })?;
        }

        // DRS_RETRIES
        if let Ok(retries) = std::env::var("DRS_RETRIES") {
            self.network.retries = retries.parse().map_err(|_| ConfigError::InvalidValue {
                field: "DRS_RETRIES".to_string(),
                value: retries,
            })?;
        }

        // DRS_SUPPRESS_SSL_VERIFY
        if let Ok(value) = std::env::var("DRS_SUPPRESS_SSL_VERIFY") {
            self.network.suppress_ssl_verify = match value.as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "DRS_SUPPRESS_SSL_VERIFY".to_string(),
                        value,
                    }
                    .into())
                }
            };
        }

        if let Ok(dir) = std::env::var("DRS_OUTPUT_DIR") {
            self.download.output_dir = Some(PathBuf::from(dir));
        }

        if let Ok(checksum) = std::env::var("DRS_CHECKSUM") {
            self.download.checksum = Some(checksum);
        }

        if let Ok(token) = std::env::var("DRS_AUTH_TOKEN") {
            self.auth.token = Some(token);
        }

        Ok(())
    }

    /// Check values that serde cannot
    ///
    /// # Errors
    ///
    /// Returns an error for a zero-sized worker pool or an unsupported
    /// checksum algorithm.
    pub fn validate(&self) -> Result<(), Error> {
        if self.general.workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "workers".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        self.checksum_preference()?;
        Ok(())
    }

    /// Parsed checksum preference
    ///
    /// # Errors
    ///
    /// Returns an error if the configured algorithm is not supported.
    pub fn checksum_preference(&self) -> Result<Option<ChecksumAlgorithm>, Error> {
        self.download
            .checksum
            .as_deref()
            .map(str::parse)
            .transpose()
    }

    /// Get the output directory (with default)
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.download
            .output_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Headers sent with every metadata and byte request
    #[must_use]
    pub fn auth_headers(&self) -> AuthHeaders {
        let mut headers = match self.auth.token.as_deref() {
            Some(token) if !token.is_empty() => AuthHeaders::bearer(token),
            _ => AuthHeaders::new(),
        };
        for (name, value) in &self.auth.headers {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.network.timeout)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.network.connect_timeout)
    }

    #[must_use]
    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_secs(self.download.chunk_timeout)
    }
}
