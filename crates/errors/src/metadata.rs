//! DRS metadata document errors

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum MetadataError {
    #[error("invalid JSON: {message}")]
    InvalidJson { message: String },

    #[error("object {id}: carries both contents and access methods")]
    AmbiguousObject { id: String },

    #[error("object {id}: carries neither contents nor access methods")]
    UnclassifiedObject { id: String },

    #[error("object {id}: blob declares no checksums")]
    MissingChecksums { id: String },

    #[error("object {id}: access method {index} has neither access_url nor access_id")]
    EmptyAccessMethod { id: String, index: usize },

    #[error("object {id}: malformed access header {header:?}")]
    MalformedHeader { id: String, header: String },

    #[error("object {id}: content entry {index} has no id")]
    MissingContentId { id: String, index: usize },
}

impl UserFacingError for MetadataError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidJson { .. } => Some("The server did not return a DRS object document."),
            _ => Some("The server returned a DRS object this client cannot interpret."),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::InvalidJson { .. } => "metadata.invalid_json",
            Self::AmbiguousObject { .. } => "metadata.ambiguous",
            Self::UnclassifiedObject { .. } => "metadata.unclassified",
            Self::MissingChecksums { .. } => "metadata.missing_checksums",
            Self::EmptyAccessMethod { .. } => "metadata.empty_access_method",
            Self::MalformedHeader { .. } => "metadata.malformed_header",
            Self::MissingContentId { .. } => "metadata.missing_content_id",
        })
    }
}
