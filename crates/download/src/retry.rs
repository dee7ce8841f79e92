//! Retry classification and backoff calculations

use super::config::RetryConfig;
use drs_errors::{Error, UserFacingError};
use std::time::Duration;

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RetryDecision {
    /// Transient; try again after backoff
    Backoff,
    /// 401 the first time; refresh credentials and try again
    RefreshAuth,
    /// Credentials rejected for good
    AuthRejected(u16),
    /// Permanent
    GiveUp,
}

pub(crate) fn classify(error: &Error, auth_refreshed: bool) -> RetryDecision {
    let auth_rejection = matches!(error, Error::Network(net) if net.is_auth_rejection());
    match error.http_status() {
        Some(401) if !auth_refreshed => RetryDecision::RefreshAuth,
        Some(status) if auth_rejection => RetryDecision::AuthRejected(status),
        _ if error.is_retryable() => RetryDecision::Backoff,
        _ => RetryDecision::GiveUp,
    }
}

/// Calculate exponential backoff delay with jitter
pub(crate) fn calculate_backoff_delay(retry_config: &RetryConfig, attempt: u32) -> Duration {
    let base_delay = {
        // Precision loss acceptable for backoff calculations - we don't need nanosecond precision
        #[allow(clippy::cast_precision_loss)]
        {
            retry_config
                .initial_delay
                .as_millis()
                .min(u128::from(u64::MAX)) as f64
        }
    };
    let multiplier = retry_config.backoff_multiplier;
    let max_delay = {
        #[allow(clippy::cast_precision_loss)]
        {
            retry_config.max_delay.as_millis().min(u128::from(u64::MAX)) as f64
        }
    };

    let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
    let delay = (base_delay * multiplier.powi(exponent)).min(max_delay);

    // Add jitter
    let jitter = delay * retry_config.jitter_factor * (rand::random::<f64>() - 0.5);
    let final_delay = {
        // Safe cast: max(0.0) ensures non-negative, round() handles fractional part
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            (delay + jitter).max(0.0).round() as u64
        }
    };

    Duration::from_millis(final_delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use drs_errors::NetworkError;

    fn http(status: u16) -> Error {
        NetworkError::HttpError {
            status,
            message: String::new(),
        }
        .into()
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let config = RetryConfig {
            max_retries: 10,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
        };
        assert_eq!(calculate_backoff_delay(&config, 1), Duration::from_millis(100));
        assert_eq!(calculate_backoff_delay(&config, 2), Duration::from_millis(200));
        assert_eq!(calculate_backoff_delay(&config, 3), Duration::from_millis(350));
        assert_eq!(calculate_backoff_delay(&config, 9), Duration::from_millis(350));
    }

    #[test]
    fn test_jitter_stays_in_band() {
        let config = RetryConfig {
            jitter_factor: 0.5,
            initial_delay: Duration::from_millis(1000),
            ..RetryConfig::default()
        };
        for _ in 0..50 {
            let delay = calculate_backoff_delay(&config, 1).as_millis();
            assert!((750..=1250).contains(&delay), "{delay}");
        }
    }

    #[test]
    fn test_classification() {
        assert_eq!(classify(&http(503), false), RetryDecision::Backoff);
        assert_eq!(classify(&http(429), false), RetryDecision::Backoff);
        assert_eq!(classify(&http(404), false), RetryDecision::GiveUp);
        assert_eq!(classify(&http(401), false), RetryDecision::RefreshAuth);
        assert_eq!(classify(&http(401), true), RetryDecision::AuthRejected(401));
        assert_eq!(classify(&http(403), false), RetryDecision::AuthRejected(403));
        let truncated: Error = NetworkError::Truncated {
            url: "u".into(),
            expected: 10,
            received: 4,
        }
        .into();
        assert_eq!(classify(&truncated, false), RetryDecision::Backoff);
        assert_eq!(
            classify(&Error::internal("boom"), false),
            RetryDecision::GiveUp
        );
    }
}
