//! Data accessor: end-to-end transfer of one blob
//!
//! An accessor picks an access method, streams the bytes to its destination
//! while hashing them, verifies the declared checksums and settles on exactly
//! one terminal [`Outcome`]. Transient failures are retried with backoff; a
//! first 401 gets one retry with refreshed credentials.

use crate::config::TransferConfig;
use crate::retry::{calculate_backoff_delay, classify, RetryDecision};
use crate::stream::{stream_to_file, AttemptError, StreamParams, StreamResult};
use crate::verify::{compare, expected_checksums};
use drs_errors::{Error, UserFacingError};
use drs_events::{AppEvent, DownloadEvent, EventEmitter, EventSender, FailureContext};
use drs_hash::ChecksumAlgorithm;
use drs_net::Transport;
use drs_types::{
    AccessUrl, AuthHeaders, Blob, ChecksumStatus, FailureReason, Outcome, ReportEntry,
};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::fs;

/// Shared collaborators for every accessor in a run
#[derive(Clone)]
pub struct AccessContext {
    pub transport: Arc<dyn Transport>,
    pub config: TransferConfig,
    pub tx: Option<EventSender>,
}

impl AccessContext {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, config: TransferConfig) -> Self {
        Self {
            transport,
            config,
            tx: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }
}

impl EventEmitter for AccessContext {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

/// Transfer state for one blob
#[derive(Debug, Clone)]
pub struct DataAccessor {
    blob: Arc<Blob>,
    destination: PathBuf,
    headers: AuthHeaders,
    retries: u32,
    outcome: Outcome,
    summary: Option<ReportEntry>,
}

/// How the bytes will be reached
enum AccessChoice<'a> {
    Direct(&'a AccessUrl),
    Indirect(&'a str),
}

/// What a finished run settled on
struct RunResult {
    outcome: Outcome,
    bytes_written: u64,
    checksum: ChecksumStatus,
    attempts: u32,
    failure: Option<FailureContext>,
}

impl RunResult {
    fn failed(reason: FailureReason, attempts: u32, failure: Option<FailureContext>) -> Self {
        Self {
            outcome: Outcome::Failed { reason },
            bytes_written: 0,
            checksum: ChecksumStatus::NotComputed,
            attempts,
            failure,
        }
    }
}

impl DataAccessor {
    /// Accessor writing `blob` to `output_dir/<encoded id>`
    #[must_use]
    pub fn new(blob: Arc<Blob>, output_dir: &Path, headers: AuthHeaders) -> Self {
        let destination = Self::destination_for(output_dir, &blob.id);
        Self {
            blob,
            destination,
            headers,
            retries: 0,
            outcome: Outcome::Pending,
            summary: None,
        }
    }

    /// Destination for an object id
    ///
    /// Bytes in `[A-Za-z0-9._-]` are kept and every other byte is
    /// percent-encoded, so distinct ids never share a file name.
    #[must_use]
    pub fn destination_for(output_dir: &Path, object_id: &str) -> PathBuf {
        output_dir.join(encode_file_name(object_id))
    }

    #[must_use]
    pub fn object_id(&self) -> &str {
        &self.blob.id
    }

    #[must_use]
    pub fn blob(&self) -> &Blob {
        &self.blob
    }

    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    #[must_use]
    pub fn headers(&self) -> &AuthHeaders {
        &self.headers
    }

    /// Re-attempts made so far
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retries
    }

    #[must_use]
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Run the transfer to a terminal outcome
    ///
    /// Calling this again after completion returns the same summary without
    /// touching the network.
    pub async fn execute(&mut self, ctx: &AccessContext) -> ReportEntry {
        if let Some(summary) = &self.summary {
            return summary.clone();
        }

        let start = Instant::now();
        let run = self.run(ctx).await;
        let elapsed = start.elapsed();

        match &run.outcome {
            Outcome::Failed { reason } => {
                ctx.emit(AppEvent::Download(DownloadEvent::Failed {
                    object_id: self.blob.id.clone(),
                    reason: reason.to_string(),
                    failure: run.failure.clone(),
                }));
            }
            _ => {
                ctx.emit(AppEvent::Download(DownloadEvent::Completed {
                    object_id: self.blob.id.clone(),
                    bytes_written: run.bytes_written,
                    elapsed,
                }));
            }
        }

        let entry = ReportEntry {
            object_id: self.blob.id.clone(),
            name: self.blob.name.clone(),
            destination: self.destination.clone(),
            bytes_written: run.bytes_written,
            checksum: run.checksum,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            attempts: run.attempts,
            outcome: run.outcome.clone(),
        };
        self.outcome = run.outcome;
        self.summary = Some(entry.clone());
        entry
    }

    async fn run(&mut self, ctx: &AccessContext) -> RunResult {
        let blob = Arc::clone(&self.blob);
        let Some(choice) = select_access(&blob) else {
            return RunResult::failed(FailureReason::NoAccessMethod, 0, None);
        };

        if let Some(parent) = self.destination.parent() {
            if let Err(e) = fs::create_dir_all(parent).await {
                let err = Error::io_with_path(&e, parent);
                return RunResult::failed(
                    FailureReason::Storage {
                        message: err.to_string(),
                    },
                    0,
                    Some(FailureContext::from_error(&err)),
                );
            }
        }

        let expected = expected_checksums(&blob, ctx.config.checksum_preference);
        let algorithms: Vec<ChecksumAlgorithm> = expected.iter().map(|e| e.algorithm).collect();
        let retry = &ctx.config.retry_config;
        let mut headers = self.headers.clone();
        let mut auth_refreshed = false;
        let mut transient_retries = 0u32;

        loop {
            let attempt = self.retries + 1;
            let err = match self
                .attempt(ctx, &choice, &headers, &algorithms, attempt)
                .await
            {
                Ok(result) => return self.verify(ctx, &expected, result, attempt),
                Err(AttemptError::Storage(err)) => {
                    let err = Error::from(err);
                    return RunResult::failed(
                        FailureReason::Storage {
                            message: err.user_message().into_owned(),
                        },
                        attempt,
                        Some(FailureContext::from_error(&err)),
                    );
                }
                Err(AttemptError::Remote(err)) => err,
            };

            match classify(&err, auth_refreshed) {
                RetryDecision::RefreshAuth => {
                    auth_refreshed = true;
                    headers = match ctx.transport.refresh_auth(&headers).await {
                        Ok(fresh) => fresh,
                        Err(refresh_err) => {
                            self.discard_partial().await;
                            return RunResult::failed(
                                FailureReason::Auth { status: 401 },
                                attempt,
                                Some(FailureContext::from_error(&refresh_err)),
                            );
                        }
                    };
                    self.retries += 1;
                    self.emit_retry(ctx, &err, Duration::ZERO);
                }
                RetryDecision::Backoff if transient_retries < retry.max_retries => {
                    transient_retries += 1;
                    self.retries += 1;
                    let delay = calculate_backoff_delay(retry, transient_retries);
                    self.emit_retry(ctx, &err, delay);
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::AuthRejected(status) => {
                    self.discard_partial().await;
                    return RunResult::failed(
                        FailureReason::Auth { status },
                        attempt,
                        Some(FailureContext::from_error(&err)),
                    );
                }
                RetryDecision::Backoff | RetryDecision::GiveUp => {
                    self.discard_partial().await;
                    return RunResult::failed(
                        FailureReason::Transfer {
                            message: err.to_string(),
                            attempts: attempt,
                        },
                        attempt,
                        Some(FailureContext::from_error(&err)),
                    );
                }
            }
        }
    }

    /// One transfer attempt from byte zero
    async fn attempt(
        &self,
        ctx: &AccessContext,
        choice: &AccessChoice<'_>,
        headers: &AuthHeaders,
        algorithms: &[ChecksumAlgorithm],
        attempt: u32,
    ) -> Result<StreamResult, AttemptError> {
        let url = match choice {
            AccessChoice::Direct(url) => (*url).clone(),
            AccessChoice::Indirect(access_id) => {
                ctx.transport
                    .resolve_access_url(&self.blob.id, access_id, headers)
                    .await?
            }
        };

        ctx.emit(AppEvent::Download(DownloadEvent::Started {
            object_id: self.blob.id.clone(),
            url: url.url.clone(),
            attempt,
            total_size: (self.blob.size > 0).then_some(self.blob.size),
        }));

        let stream = ctx.transport.fetch_bytes(&url, headers).await?;
        let params = StreamParams {
            url: &url.url,
            declared_size: self.blob.size,
            chunk_timeout: ctx.config.chunk_timeout,
            algorithms,
        };
        stream_to_file(stream, &self.destination, &params).await
    }

    fn verify(
        &self,
        ctx: &AccessContext,
        expected: &[crate::verify::Expected],
        result: StreamResult,
        attempts: u32,
    ) -> RunResult {
        let checksum = compare(expected, &result.checksums);
        let outcome = match &checksum {
            ChecksumStatus::Verified { .. } => Outcome::Succeeded,
            ChecksumStatus::Unverified => {
                ctx.emit(AppEvent::Download(DownloadEvent::ChecksumUnverified {
                    object_id: self.blob.id.clone(),
                    declared: self.blob.checksums.iter().map(|c| c.kind.clone()).collect(),
                }));
                Outcome::Succeeded
            }
            // The file stays on disk for inspection
            ChecksumStatus::Mismatch {
                algorithm,
                expected,
                actual,
            } => Outcome::Failed {
                reason: FailureReason::ChecksumMismatch {
                    algorithm: *algorithm,
                    expected: expected.clone(),
                    actual: actual.clone(),
                },
            },
            ChecksumStatus::NotComputed => Outcome::Failed {
                reason: FailureReason::Internal {
                    message: "digest was not computed".to_string(),
                },
            },
        };

        RunResult {
            outcome,
            bytes_written: result.bytes_written,
            checksum,
            attempts,
            failure: None,
        }
    }

    fn emit_retry(&self, ctx: &AccessContext, err: &Error, backoff_delay: Duration) {
        ctx.emit(AppEvent::Download(DownloadEvent::Retrying {
            object_id: self.blob.id.clone(),
            attempt: self.retries + 1,
            max_attempts: ctx.config.retry_config.max_retries + 1,
            reason: err.to_string(),
            backoff_delay,
        }));
    }

    /// Incomplete bytes are never left behind under the final name
    async fn discard_partial(&self) {
        let _ = fs::remove_file(&self.destination).await;
    }
}

/// Prefer a direct URL; fall back to the first resolvable access id
fn select_access(blob: &Blob) -> Option<AccessChoice<'_>> {
    blob.access_methods
        .iter()
        .find_map(|m| m.access_url.as_ref())
        .map(AccessChoice::Direct)
        .or_else(|| {
            blob.access_methods
                .iter()
                .find_map(|m| m.access_id.as_deref())
                .map(AccessChoice::Indirect)
        })
}

fn encode_file_name(object_id: &str) -> String {
    let mut encoded = String::with_capacity(object_id.len());
    for byte in object_id.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-') {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    // "." and ".." would name directories
    if encoded.bytes().all(|b| b == b'.') {
        encoded = encoded.replace('.', "%2E");
    }
    if encoded.is_empty() {
        encoded.push('%');
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names_are_encoded() {
        let dir = Path::new("/out");
        assert_eq!(
            DataAccessor::destination_for(dir, "obj-1_v2.txt"),
            PathBuf::from("/out/obj-1_v2.txt")
        );
        assert_eq!(
            DataAccessor::destination_for(dir, "drs://host/abc"),
            PathBuf::from("/out/drs%3A%2F%2Fhost%2Fabc")
        );
        assert_eq!(encode_file_name("a%b"), "a%25b");
        assert_ne!(encode_file_name("a/b"), encode_file_name("a%2Fb"));
    }

    #[test]
    fn test_dot_ids_never_name_directories() {
        assert_eq!(encode_file_name("."), "%2E");
        assert_eq!(encode_file_name(".."), "%2E%2E");
        assert_ne!(encode_file_name(".."), encode_file_name("%2E%2E"));
        assert_eq!(encode_file_name(""), "%");
    }

    #[test]
    fn test_direct_access_is_preferred() {
        let blob = Blob {
            id: "obj".into(),
            name: None,
            size: 0,
            checksums: Vec::new(),
            access_methods: vec![
                drs_types::AccessMethod {
                    kind: "s3".into(),
                    access_url: None,
                    access_id: Some("s3-1".into()),
                },
                drs_types::AccessMethod {
                    kind: "https".into(),
                    access_url: Some(AccessUrl {
                        url: "https://x/obj".into(),
                        headers: Vec::new(),
                    }),
                    access_id: None,
                },
            ],
        };
        assert!(matches!(
            select_access(&blob),
            Some(AccessChoice::Direct(url)) if url.url == "https://x/obj"
        ));

        let indirect_only = Blob {
            access_methods: blob.access_methods[..1].to_vec(),
            ..blob
        };
        assert!(matches!(
            select_access(&indirect_only),
            Some(AccessChoice::Indirect("s3-1"))
        ));
    }
}
