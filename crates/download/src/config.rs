//! Configuration structures for object transfers

use drs_hash::ChecksumAlgorithm;
use std::time::Duration;

/// Settings shared by every accessor in a run
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Size of the worker pool (0 is treated as 1)
    pub workers: usize,
    /// Retry configuration
    pub retry_config: RetryConfig,
    /// Timeout for individual chunks (default: 30s)
    pub chunk_timeout: Duration,
    /// Only check this algorithm when the object declares it
    pub checksum_preference: Option<ChecksumAlgorithm>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            retry_config: RetryConfig::default(),
            chunk_timeout: Duration::from_secs(30),
            checksum_preference: None,
        }
    }
}

/// Retry configuration for transfers
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries
    pub max_retries: u32,
    /// Initial backoff delay
    pub initial_delay: Duration,
    /// Maximum backoff delay
    pub max_delay: Duration,
    /// Backoff multiplier
    pub backoff_multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}
