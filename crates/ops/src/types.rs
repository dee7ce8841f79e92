//! Request and result types for operations

use drs_types::Report;
use serde::Serialize;
use std::path::PathBuf;

/// What `get` should do with one object id
#[derive(Debug, Clone)]
pub struct GetRequest {
    pub object_id: String,
    /// Ask the server to inline bundle contents
    pub expand: bool,
    /// Download the object (or every blob under a bundle)
    pub download: bool,
    pub output_dir: PathBuf,
}

impl GetRequest {
    /// Metadata-only request
    #[must_use]
    pub fn metadata(object_id: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            expand: false,
            download: false,
            output_dir: PathBuf::from("."),
        }
    }

    #[must_use]
    pub fn with_expand(mut self, expand: bool) -> Self {
        self.expand = expand;
        self
    }

    /// Download into `output_dir`
    #[must_use]
    pub fn with_download(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.download = true;
        self.output_dir = output_dir.into();
        self
    }
}

/// Result of a `get`
#[derive(Debug, Clone, Serialize)]
pub struct GetOutcome {
    /// Root metadata document, pretty-printed
    pub metadata: String,
    /// Present when a download was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
}

impl GetOutcome {
    /// False when any object failed or a bundle branch was lost
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.report.as_ref().is_none_or(Report::is_success)
    }
}
