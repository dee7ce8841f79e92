//! The seam between DRS logic and the wire
//!
//! Resolver and download code only talk to a [`Transport`]. The HTTP
//! implementation lives here; tests substitute an in-memory one.

use crate::client::{map_reqwest_error, NetClient, NetConfig};
use crate::validation::{join_segments, validate_url};
use async_trait::async_trait;
use bytes::Bytes;
use drs_errors::{Error, NetworkError};
use drs_events::{EventEmitter, EventSender};
use drs_types::{AccessUrl, AuthHeaders};
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use url::Url;

/// Body of a byte transfer, chunk by chunk
pub type ByteStream = BoxStream<'static, Result<Bytes, Error>>;

/// Everything the client needs from a DRS server
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the raw metadata document for an object
    async fn fetch_object(
        &self,
        object_id: &str,
        expand: bool,
        headers: &AuthHeaders,
    ) -> Result<serde_json::Value, Error>;

    /// Exchange an `access_id` for a concrete URL
    async fn resolve_access_url(
        &self,
        object_id: &str,
        access_id: &str,
        headers: &AuthHeaders,
    ) -> Result<AccessUrl, Error>;

    /// Open a byte stream for a resolved URL
    async fn fetch_bytes(&self, url: &AccessUrl, headers: &AuthHeaders)
        -> Result<ByteStream, Error>;

    /// Produce fresh credentials after a 401
    ///
    /// Static credentials cannot be refreshed, so the default hands back
    /// the same headers.
    async fn refresh_auth(&self, headers: &AuthHeaders) -> Result<AuthHeaders, Error> {
        Ok(headers.clone())
    }
}

/// `Transport` over HTTP(S) against a DRS v1 server
#[derive(Clone)]
pub struct HttpTransport {
    client: NetClient,
    base: Url,
    tx: Option<EventSender>,
}

impl HttpTransport {
    /// Create a transport for the server at `base_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be
    /// initialized.
    pub fn new(base_url: &str, config: NetConfig) -> Result<Self, Error> {
        let base = validate_url(base_url)?;
        let client = NetClient::new(config)?;
        Ok(Self {
            client,
            base,
            tx: None,
        })
    }

    /// Emit debug events for each request
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `{base}/ga4gh/drs/v1/objects/{id}`
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry a path.
    pub fn object_url(&self, object_id: &str) -> Result<Url, Error> {
        join_segments(&self.base, ["ga4gh", "drs", "v1", "objects", object_id])
    }

    /// `{base}/ga4gh/drs/v1/objects/{id}/access/{access_id}`
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry a path.
    pub fn access_url(&self, object_id: &str, access_id: &str) -> Result<Url, Error> {
        join_segments(
            &self.base,
            ["ga4gh", "drs", "v1", "objects", object_id, "access", access_id],
        )
    }

    async fn get_json(&self, url: &Url, headers: &AuthHeaders) -> Result<serde_json::Value, Error> {
        self.tx.emit_debug(format!("GET {url}"));
        let response = self.client.get_with_retry(url.as_str(), headers).await?;
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_object(
        &self,
        object_id: &str,
        expand: bool,
        headers: &AuthHeaders,
    ) -> Result<serde_json::Value, Error> {
        let mut url = self.object_url(object_id)?;
        if expand {
            url.query_pairs_mut().append_pair("expand", "true");
        }
        self.get_json(&url, headers).await
    }

    async fn resolve_access_url(
        &self,
        object_id: &str,
        access_id: &str,
        headers: &AuthHeaders,
    ) -> Result<AccessUrl, Error> {
        let url = self.access_url(object_id, access_id)?;
        let body = self.get_json(&url, headers).await?;
        Ok(AccessUrl::from_json(object_id, body)?)
    }

    async fn fetch_bytes(
        &self,
        url: &AccessUrl,
        headers: &AuthHeaders,
    ) -> Result<ByteStream, Error> {
        let target = Url::parse(&url.url).map_err(|e| NetworkError::InvalidUrl(e.to_string()))?;
        match target.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(NetworkError::UnsupportedProtocol {
                    protocol: scheme.to_string(),
                }
                .into())
            }
        }

        // Access-method headers override the caller's on name clashes
        let merged = headers.merged_with(&url.headers);
        self.tx.emit_debug(format!("GET {target} (bytes)"));
        let response = self.client.get_once(target.as_str(), merged.iter()).await?;

        Ok(response
            .bytes_stream()
            .map_err(|e| Error::from(map_reqwest_error(e)))
            .boxed())
    }
}
