//! Report type definitions for download runs

use chrono::{DateTime, Utc};
use drs_hash::ChecksumAlgorithm;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Why an accessor failed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// Bytes were written but a declared checksum did not match
    ChecksumMismatch {
        algorithm: ChecksumAlgorithm,
        expected: String,
        actual: String,
    },
    /// Transfer failed and could not be retried further
    Transfer { message: String, attempts: u32 },
    /// The server rejected the credentials
    Auth { status: u16 },
    /// The object has no access method this client can use
    NoAccessMethod,
    /// The destination could not be written
    Storage { message: String },
    /// The worker running the accessor died
    Internal { message: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChecksumMismatch {
                algorithm,
                expected,
                actual,
            } => write!(
                f,
                "checksum mismatch ({algorithm}): expected {expected}, got {actual}"
            ),
            Self::Transfer { message, attempts } => {
                write!(f, "transfer failed after {attempts} attempt(s): {message}")
            }
            Self::Auth { status } => write!(f, "credentials rejected (HTTP {status})"),
            Self::NoAccessMethod => f.write_str("no usable access method"),
            Self::Storage { message } => write!(f, "storage error: {message}"),
            Self::Internal { message } => write!(f, "internal error: {message}"),
        }
    }
}

/// Lifecycle of one accessor; `Pending` until a worker finishes it
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    #[default]
    Pending,
    Succeeded,
    Failed { reason: FailureReason },
}

impl Outcome {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    #[must_use]
    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            Self::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Result of checking the written bytes against declared checksums
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ChecksumStatus {
    /// Every checked algorithm matched
    Verified { algorithms: Vec<ChecksumAlgorithm> },
    /// A checked algorithm did not match
    Mismatch {
        algorithm: ChecksumAlgorithm,
        expected: String,
        actual: String,
    },
    /// No declared algorithm is supported
    Unverified,
    /// The transfer did not complete
    NotComputed,
}

impl fmt::Display for ChecksumStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified { algorithms } => {
                let names: Vec<&str> = algorithms.iter().map(|a| a.as_str()).collect();
                write!(f, "ok ({})", names.join(", "))
            }
            Self::Mismatch { algorithm, .. } => write!(f, "mismatch ({algorithm})"),
            Self::Unverified => f.write_str("unverified"),
            Self::NotComputed => f.write_str("-"),
        }
    }
}

/// One accessor's terminal summary
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportEntry {
    pub object_id: String,
    pub name: Option<String>,
    pub destination: PathBuf,
    pub bytes_written: u64,
    pub checksum: ChecksumStatus,
    pub elapsed_ms: u64,
    pub attempts: u32,
    pub outcome: Outcome,
}

impl ReportEntry {
    /// Human readable error detail for failed entries
    #[must_use]
    pub fn error_detail(&self) -> Option<String> {
        self.outcome.failure().map(ToString::to_string)
    }
}

/// Problems found while walking a bundle graph
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionIssue {
    /// An id was reached a second time and skipped
    CycleOrDuplicate { id: String, parent_id: String },
    /// A nested reference could not be fetched or parsed; its branch was skipped
    BranchError {
        id: String,
        parent_id: String,
        message: String,
    },
}

impl ResolutionIssue {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::BranchError { .. })
    }

    #[must_use]
    pub fn object_id(&self) -> &str {
        match self {
            Self::CycleOrDuplicate { id, .. } | Self::BranchError { id, .. } => id,
        }
    }
}

impl fmt::Display for ResolutionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CycleOrDuplicate { id, parent_id } => {
                write!(f, "{id} (in {parent_id}) already visited, skipped")
            }
            Self::BranchError {
                id,
                parent_id,
                message,
            } => write!(f, "{id} (in {parent_id}) could not be resolved: {message}"),
        }
    }
}

/// Final report of a download run, in submission order
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Report {
    /// When the last accessor finished
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<ReportEntry>,
    pub succeeded: usize,
    pub failed: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ResolutionIssue>,
}

impl Report {
    /// Build a report and its aggregate counts
    #[must_use]
    pub fn new(entries: Vec<ReportEntry>, issues: Vec<ResolutionIssue>) -> Self {
        let succeeded = entries.iter().filter(|e| e.outcome.is_success()).count();
        let failed = entries.len() - succeeded;
        Self {
            generated_at: Utc::now(),
            entries,
            succeeded,
            failed,
            issues,
        }
    }

    /// Attach traversal issues found before the downloads ran
    #[must_use]
    pub fn with_issues(mut self, issues: Vec<ResolutionIssue>) -> Self {
        self.issues.extend(issues);
        self
    }

    /// True when every object was downloaded and verified and no branch was lost
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed == 0 && !self.issues.iter().any(ResolutionIssue::is_error)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| !e.outcome.is_success())
    }
}
