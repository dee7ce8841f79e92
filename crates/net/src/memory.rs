//! In-memory `Transport` for tests
//!
//! Objects, access ids and byte bodies are registered up front. Byte replies
//! are scripted per URL: each fetch pops the next reply and the last one
//! repeats forever.

use crate::transport::{ByteStream, Transport};
use async_trait::async_trait;
use bytes::Bytes;
use drs_errors::{Error, NetworkError};
use drs_types::{AccessUrl, AuthHeaders};
use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Chunk size used when replaying a body
const CHUNK: usize = 8;

/// One scripted answer to `fetch_bytes`
#[derive(Debug, Clone)]
pub enum ByteReply {
    /// Full body, delivered in small chunks
    Body(Vec<u8>),
    /// HTTP error status before any byte is sent
    Status(u16),
    /// These bytes, then a broken stream
    Interrupted(Vec<u8>),
    /// A stream that never yields
    Stall,
    /// Panic inside the transport call
    Panic,
}

#[derive(Default)]
struct State {
    objects: HashMap<String, Result<serde_json::Value, Error>>,
    access: HashMap<(String, String), AccessUrl>,
    replies: HashMap<String, VecDeque<ByteReply>>,
    object_fetches: HashMap<String, usize>,
    byte_fetches: HashMap<String, usize>,
    seen_headers: Vec<AuthHeaders>,
    refreshes: usize,
}

/// Scriptable in-memory transport
#[derive(Default)]
pub struct MemoryTransport {
    state: Mutex<State>,
    refreshed_token: Option<String>,
    refresh_rejected: Option<u16>,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bearer token handed out by `refresh_auth`
    #[must_use]
    pub fn with_refreshed_token(mut self, token: impl Into<String>) -> Self {
        self.refreshed_token = Some(token.into());
        self
    }

    /// Make `refresh_auth` fail with an HTTP status
    #[must_use]
    pub fn with_refresh_rejected(mut self, status: u16) -> Self {
        self.refresh_rejected = Some(status);
        self
    }

    pub fn add_object(&self, id: impl Into<String>, document: serde_json::Value) {
        self.lock().objects.insert(id.into(), Ok(document));
    }

    /// Make metadata fetches for `id` fail with an HTTP status
    pub fn fail_object(&self, id: impl Into<String>, status: u16) {
        self.lock().objects.insert(
            id.into(),
            Err(NetworkError::HttpError {
                status,
                message: "scripted failure".to_string(),
            }
            .into()),
        );
    }

    pub fn add_access(&self, object_id: &str, access_id: &str, url: AccessUrl) {
        self.lock()
            .access
            .insert((object_id.to_string(), access_id.to_string()), url);
    }

    /// Serve `body` for every fetch of `url`
    pub fn add_body(&self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.script(url, vec![ByteReply::Body(body.into())]);
    }

    /// Serve `replies` in order; the last one repeats
    pub fn script(&self, url: impl Into<String>, replies: Vec<ByteReply>) {
        self.lock().replies.insert(url.into(), replies.into());
    }

    #[must_use]
    pub fn object_fetches(&self, id: &str) -> usize {
        self.lock().object_fetches.get(id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn byte_fetches(&self, url: &str) -> usize {
        self.lock().byte_fetches.get(url).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn refreshes(&self) -> usize {
        self.lock().refreshes
    }

    /// Headers sent with every byte fetch, in call order
    #[must_use]
    pub fn seen_headers(&self) -> Vec<AuthHeaders> {
        self.lock().seen_headers.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A panic in another test thread must not hide this test's result
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn next_reply(&self, url: &str) -> Option<ByteReply> {
        let mut state = self.lock();
        *state.byte_fetches.entry(url.to_string()).or_default() += 1;
        let queue = state.replies.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

fn chunks(body: Vec<u8>) -> Vec<Result<Bytes, Error>> {
    body.chunks(CHUNK)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect()
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn fetch_object(
        &self,
        object_id: &str,
        _expand: bool,
        _headers: &AuthHeaders,
    ) -> Result<serde_json::Value, Error> {
        let mut state = self.lock();
        *state
            .object_fetches
            .entry(object_id.to_string())
            .or_default() += 1;
        match state.objects.get(object_id) {
            Some(result) => result.clone(),
            None => Err(NetworkError::HttpError {
                status: 404,
                message: "Not Found".to_string(),
            }
            .into()),
        }
    }

    async fn resolve_access_url(
        &self,
        object_id: &str,
        access_id: &str,
        _headers: &AuthHeaders,
    ) -> Result<AccessUrl, Error> {
        self.lock()
            .access
            .get(&(object_id.to_string(), access_id.to_string()))
            .cloned()
            .ok_or_else(|| {
                NetworkError::HttpError {
                    status: 404,
                    message: "Not Found".to_string(),
                }
                .into()
            })
    }

    async fn fetch_bytes(
        &self,
        url: &AccessUrl,
        headers: &AuthHeaders,
    ) -> Result<ByteStream, Error> {
        self.lock()
            .seen_headers
            .push(headers.merged_with(&url.headers));

        match self.next_reply(&url.url) {
            None => Err(NetworkError::HttpError {
                status: 404,
                message: "Not Found".to_string(),
            }
            .into()),
            Some(ByteReply::Status(status)) => Err(NetworkError::HttpError {
                status,
                message: "scripted status".to_string(),
            }
            .into()),
            Some(ByteReply::Body(body)) => Ok(futures::stream::iter(chunks(body)).boxed()),
            Some(ByteReply::Interrupted(body)) => {
                let mut items = chunks(body);
                items.push(Err(NetworkError::DownloadFailed(
                    "connection reset".to_string(),
                )
                .into()));
                Ok(futures::stream::iter(items).boxed())
            }
            Some(ByteReply::Stall) => Ok(futures::stream::pending::<Result<Bytes, Error>>().boxed()),
            Some(ByteReply::Panic) => panic!("scripted panic fetching {}", url.url),
        }
    }

    async fn refresh_auth(&self, headers: &AuthHeaders) -> Result<AuthHeaders, Error> {
        self.lock().refreshes += 1;
        if let Some(status) = self.refresh_rejected {
            return Err(NetworkError::HttpError {
                status,
                message: "token refresh rejected".to_string(),
            }
            .into());
        }
        let mut fresh = headers.clone();
        if let Some(token) = &self.refreshed_token {
            fresh.insert("Authorization", format!("Bearer {token}"));
        }
        Ok(fresh)
    }
}
