//! Network-related error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NetworkError {
    #[error("connection timeout to {url}")]
    Timeout { url: String },

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported protocol: {protocol}")]
    UnsupportedProtocol { protocol: String },

    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("truncated transfer from {url}: expected {expected} bytes, received {received}")]
    Truncated {
        url: String,
        expected: u64,
        received: u64,
    },

    #[error("SSL/TLS error: {0}")]
    TlsError(String),

    #[error("client setup failed: {0}")]
    ClientSetup(String),
}

impl NetworkError {
    /// Whether the server rejected the supplied credentials
    #[must_use]
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::HttpError { status: 401 | 403, .. })
    }
}

impl UserFacingError for NetworkError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Timeout { .. } | Self::ConnectionRefused(_) => {
                Some("Check that the DRS server is reachable and retry.")
            }
            Self::HttpError {
                status: 401 | 403, ..
            } => Some("Check the auth token passed with --authtoken or DRS_AUTH_TOKEN."),
            Self::HttpError { status: 404, .. } => {
                Some("Check the object id and the server base URL.")
            }
            Self::TlsError(_) => {
                Some("Pass --suppress-ssl-verify only if you trust the server.")
            }
            Self::InvalidUrl(_) | Self::UnsupportedProtocol { .. } => {
                Some("Use an http:// or https:// server URL.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. }
            | Self::ConnectionRefused(_)
            | Self::DownloadFailed(_)
            | Self::Truncated { .. } => true,
            Self::HttpError { status, .. } => *status >= 500 || *status == 429,
            Self::InvalidUrl(_)
            | Self::UnsupportedProtocol { .. }
            | Self::TlsError(_)
            | Self::ClientSetup(_) => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::Timeout { .. } => "network.timeout",
            Self::DownloadFailed(_) => "network.download_failed",
            Self::ConnectionRefused(_) => "network.connection_refused",
            Self::InvalidUrl(_) => "network.invalid_url",
            Self::UnsupportedProtocol { .. } => "network.unsupported_protocol",
            Self::HttpError { .. } => "network.http_error",
            Self::Truncated { .. } => "network.truncated",
            Self::TlsError(_) => "network.tls",
            Self::ClientSetup(_) => "network.client_setup",
        })
    }
}
