//! Low-level streaming transfer mechanics

use drs_errors::{Error, NetworkError, StorageError};
use drs_hash::{Checksum, ChecksumAlgorithm, MultiHasher};
use drs_net::ByteStream;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Why a single attempt ended early
#[derive(Debug)]
pub(crate) enum AttemptError {
    /// Local file-system failure; never retried
    Storage(StorageError),
    /// Anything the server or the wire did
    Remote(Error),
}

impl From<Error> for AttemptError {
    fn from(err: Error) -> Self {
        Self::Remote(err)
    }
}

/// Parameters for one streaming transfer
pub(crate) struct StreamParams<'a> {
    /// URL being downloaded - used for timeout error reporting
    pub url: &'a str,
    /// Declared size; 0 when unknown
    pub declared_size: u64,
    pub chunk_timeout: Duration,
    pub algorithms: &'a [ChecksumAlgorithm],
}

/// Bytes written and digests computed in the same pass
#[derive(Debug)]
pub(crate) struct StreamResult {
    pub bytes_written: u64,
    pub checksums: Vec<Checksum>,
}

fn storage(err: &std::io::Error, path: &Path) -> AttemptError {
    AttemptError::Storage(StorageError::from_io_with_path(err, path))
}

/// Stream `stream` into `dest_path`, hashing as it goes
///
/// The file is truncated first, so every attempt starts from byte zero.
pub(crate) async fn stream_to_file(
    mut stream: ByteStream,
    dest_path: &Path,
    params: &StreamParams<'_>,
) -> Result<StreamResult, AttemptError> {
    let mut file = File::create(dest_path)
        .await
        .map_err(|e| storage(&e, dest_path))?;
    let mut hasher = MultiHasher::new(params.algorithms.iter().copied());

    loop {
        match tokio::time::timeout(params.chunk_timeout, stream.next()).await {
            Ok(Some(chunk)) => {
                let chunk = chunk?;
                hasher.update(&chunk);
                file.write_all(&chunk)
                    .await
                    .map_err(|e| storage(&e, dest_path))?;
            }
            Ok(None) => break,
            Err(_) => {
                return Err(Error::from(NetworkError::Timeout {
                    url: params.url.to_string(),
                })
                .into())
            }
        }
    }

    file.flush().await.map_err(|e| storage(&e, dest_path))?;
    drop(file);

    let received = hasher.bytes_hashed();
    if params.declared_size > 0 && received != params.declared_size {
        return Err(AttemptError::Remote(
            NetworkError::Truncated {
                url: params.url.to_string(),
                expected: params.declared_size,
                received,
            }
            .into(),
        ));
    }

    Ok(StreamResult {
        bytes_written: received,
        checksums: hasher.finalize(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    fn stream_of(parts: &[&'static str], broken: bool) -> ByteStream {
        let mut items: Vec<Result<bytes::Bytes, Error>> = parts
            .iter()
            .map(|p| Ok(bytes::Bytes::from_static(p.as_bytes())))
            .collect();
        if broken {
            items.push(Err(NetworkError::DownloadFailed("reset".into()).into()));
        }
        futures::stream::iter(items).boxed()
    }

    fn params(declared_size: u64) -> StreamParams<'static> {
        StreamParams {
            url: "https://example.org/x",
            declared_size,
            chunk_timeout: Duration::from_secs(5),
            algorithms: &[ChecksumAlgorithm::Md5],
        }
    }

    #[tokio::test]
    async fn test_writes_and_hashes_in_one_pass() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        let stream = stream_of(&["hello ", "world"], false);

        let result = stream_to_file(stream, &dest, &params(11)).await.unwrap();

        assert_eq!(result.bytes_written, 11);
        assert_eq!(
            result.checksums[0].to_hex(),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_short_stream_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        let stream = stream_of(&["hello"], false);

        let err = stream_to_file(stream, &dest, &params(11)).await.unwrap_err();
        assert!(matches!(
            err,
            AttemptError::Remote(Error::Network(NetworkError::Truncated {
                expected: 11,
                received: 5,
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_unknown_size_is_not_checked() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        let stream = stream_of(&["hello"], false);

        let result = stream_to_file(stream, &dest, &params(0)).await.unwrap();
        assert_eq!(result.bytes_written, 5);
    }

    #[tokio::test]
    async fn test_broken_stream_is_remote_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        let stream = stream_of(&["hel"], true);

        let err = stream_to_file(stream, &dest, &params(0)).await.unwrap_err();
        assert!(matches!(err, AttemptError::Remote(_)));
    }

    #[tokio::test]
    async fn test_missing_directory_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("no/such/dir/out");
        let stream = stream_of(&["x"], false);

        let err = stream_to_file(stream, &dest, &params(0)).await.unwrap_err();
        assert!(matches!(err, AttemptError::Storage(_)));
    }
}
