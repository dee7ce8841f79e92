use serde::{Deserialize, Serialize};

use crate::{EventLevel, EventSource};
use drs_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code, when the error has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod download;
pub mod general;
pub mod resolver;

pub use download::*;
pub use general::*;
pub use resolver::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Bundle graph traversal
    Resolver(ResolverEvent),

    /// Per-object transfers and the worker pool
    Download(DownloadEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Resolver(_) => EventSource::RESOLVER,
            Self::Download(_) => EventSource::DOWNLOAD,
        }
    }

    /// Determine the appropriate log level for this event
    #[must_use]
    pub fn level(&self) -> EventLevel {
        match self {
            Self::General(GeneralEvent::Error { .. } | GeneralEvent::OperationFailed { .. })
            | Self::Resolver(ResolverEvent::BranchFailed { .. })
            | Self::Download(DownloadEvent::Failed { .. }) => EventLevel::Error,

            Self::General(GeneralEvent::Warning { .. })
            | Self::Resolver(ResolverEvent::DuplicateSkipped { .. })
            | Self::Download(
                DownloadEvent::Retrying { .. } | DownloadEvent::ChecksumUnverified { .. },
            ) => EventLevel::Warn,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Resolver(ResolverEvent::ObjectFetched { .. })
            | Self::Download(DownloadEvent::Queued { .. } | DownloadEvent::Started { .. }) => {
                EventLevel::Debug
            }

            _ => EventLevel::Info,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "drs::events::general",
            Self::Resolver(_) => "drs::events::resolver",
            Self::Download(_) => "drs::events::download",
        }
    }
}
