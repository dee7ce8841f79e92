//! HTTP client with connection pooling and retry logic

use drs_errors::{Error, NetworkError};
use drs_types::AuthHeaders;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    /// Retries for metadata requests; byte transfers retry in the accessor
    pub retry_count: u32,
    pub retry_delay: Duration,
    pub user_agent: String,
    /// Skip TLS certificate verification
    pub accept_invalid_certs: bool,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300), // 5 minutes for large downloads
            connect_timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            retry_count: 3,
            retry_delay: Duration::from_millis(500),
            user_agent: format!("drs-client/{}", env!("CARGO_PKG_VERSION")),
            accept_invalid_certs: false,
        }
    }
}

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| NetworkError::ClientSetup(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(NetConfig::default())
    }

    #[must_use]
    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    /// GET with retries on transient failures, returning a successful response
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retry attempts or the
    /// server answers with a non-success status.
    pub async fn get_with_retry(&self, url: &str, headers: &AuthHeaders) -> Result<Response, Error> {
        let response = self
            .retry_request(|| with_headers(self.client.get(url), headers.iter()).send())
            .await?;
        check_status(response)
    }

    /// Single GET without retries, returning a successful response
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server answers with a
    /// non-success status.
    pub async fn get_once<'a>(
        &self,
        url: &str,
        headers: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Response, Error> {
        let response = with_headers(self.client.get(url), headers)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response)
    }

    /// Execute a request with retries
    async fn retry_request<F, Fut>(&self, mut f: F) -> Result<Response, Error>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<Response, reqwest::Error>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.retry_count {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_delay * attempt).await;
            }

            match f().await {
                Ok(response) => {
                    let status = response.status();
                    // Server errors and rate limiting are worth another try
                    let transient = status.is_server_error()
                        || status == reqwest::StatusCode::TOO_MANY_REQUESTS;
                    if transient && attempt < self.config.retry_count {
                        continue;
                    }
                    return Ok(response);
                }
                Err(e) => {
                    let retry = Self::should_retry(&e);
                    last_error = Some(e);

                    // Don't retry on certain errors
                    if !retry {
                        break;
                    }
                }
            }
        }

        Err(match last_error {
            Some(e) => map_reqwest_error(e).into(),
            None => NetworkError::DownloadFailed("Unknown error".to_string()).into(),
        })
    }

    /// Determine if an error should be retried
    fn should_retry(error: &reqwest::Error) -> bool {
        // Retry on timeout, connection errors, and server errors
        error.is_timeout()
            || error.is_connect()
            || error.status().is_none_or(|s| s.is_server_error())
    }
}

fn with_headers<'a>(
    mut request: RequestBuilder,
    headers: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> RequestBuilder {
    for (name, value) in headers {
        request = request.header(name, value);
    }
    request
}

/// Map a non-success status to `NetworkError::HttpError`
fn check_status(response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(NetworkError::HttpError {
        status: status.as_u16(),
        message: status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string(),
    }
    .into())
}

pub(crate) fn map_reqwest_error(e: reqwest::Error) -> NetworkError {
    if e.is_timeout() {
        NetworkError::Timeout {
            url: e
                .url()
                .map(std::string::ToString::to_string)
                .unwrap_or_default(),
        }
    } else if e.is_connect() && is_certificate_failure(&e) {
        NetworkError::TlsError(e.to_string())
    } else if e.is_connect() {
        NetworkError::ConnectionRefused(e.to_string())
    } else if e.is_builder() {
        NetworkError::ClientSetup(e.to_string())
    } else {
        NetworkError::DownloadFailed(e.to_string())
    }
}

/// reqwest only exposes TLS failures through the source chain
fn is_certificate_failure(e: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(e);
    while let Some(err) = source {
        if err.to_string().to_ascii_lowercase().contains("certificate") {
            return true;
        }
        source = err.source();
    }
    false
}
