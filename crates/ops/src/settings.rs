//! Translate the user configuration into component settings

use drs_config::Config;
use drs_download::{RetryConfig, TransferConfig};
use drs_errors::Error;
use drs_net::NetConfig;
use std::time::Duration;

/// HTTP client settings for metadata and byte requests
#[must_use]
pub fn net_config(config: &Config) -> NetConfig {
    NetConfig {
        timeout: config.request_timeout(),
        connect_timeout: config.connect_timeout(),
        retry_count: config.network.retries,
        retry_delay: Duration::from_millis(config.network.retry_delay_ms),
        accept_invalid_certs: config.network.suppress_ssl_verify,
        ..NetConfig::default()
    }
}

/// Worker pool, retry and checksum settings for the download manager
///
/// # Errors
///
/// Returns an error if the configured checksum algorithm is not supported.
pub fn transfer_config(config: &Config) -> Result<TransferConfig, Error> {
    Ok(TransferConfig {
        workers: config.general.workers,
        retry_config: RetryConfig {
            max_retries: config.network.retries,
            initial_delay: Duration::from_millis(config.network.retry_delay_ms),
            max_delay: Duration::from_secs(config.network.max_retry_delay),
            ..RetryConfig::default()
        },
        chunk_timeout: config.chunk_timeout(),
        checksum_preference: config.checksum_preference()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use drs_hash::ChecksumAlgorithm;

    #[test]
    fn test_transfer_config_follows_config() {
        let mut config = Config::default();
        config.general.workers = 7;
        config.network.retries = 5;
        config.network.retry_delay_ms = 250;
        config.download.checksum = Some("md5".to_string());

        let transfer = transfer_config(&config).unwrap();
        assert_eq!(transfer.workers, 7);
        assert_eq!(transfer.retry_config.max_retries, 5);
        assert_eq!(transfer.retry_config.initial_delay, Duration::from_millis(250));
        assert_eq!(transfer.checksum_preference, Some(ChecksumAlgorithm::Md5));
    }

    #[test]
    fn test_unknown_checksum_is_rejected() {
        let mut config = Config::default();
        config.download.checksum = Some("crc32".to_string());
        assert!(transfer_config(&config).is_err());
    }

    #[test]
    fn test_net_config_carries_tls_choice() {
        let mut config = Config::default();
        config.network.suppress_ssl_verify = true;
        let net = net_config(&config);
        assert!(net.accept_invalid_certs);
        assert_eq!(net.timeout, config.request_timeout());
    }
}
