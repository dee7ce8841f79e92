//! Storage and filesystem-related error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum StorageError {
    #[error("permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("disk full: {path}")]
    DiskFull { path: String },

    #[error("failed to write {path}: {message}")]
    WriteFailed { path: String, message: String },

    #[error("IO error: {message}")]
    IoError { message: String },
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            message: err.to_string(),
        }
    }
}

impl StorageError {
    /// Convert an `io::Error` into a `StorageError` with an associated path
    #[must_use]
    pub fn from_io_with_path(err: &std::io::Error, path: &std::path::Path) -> Self {
        let path = path.display().to_string();
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::StorageFull => Self::DiskFull { path },
            _ => Self::WriteFailed {
                path,
                message: err.to_string(),
            },
        }
    }
}

impl UserFacingError for StorageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::PermissionDenied { .. } => Some("Choose a writable --output-dir."),
            Self::DiskFull { .. } => Some("Free disk space or choose another --output-dir."),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::PermissionDenied { .. } => "storage.permission_denied",
            Self::DiskFull { .. } => "storage.disk_full",
            Self::WriteFailed { .. } => "storage.write_failed",
            Self::IoError { .. } => "storage.io",
        })
    }
}
