//! Operation orchestration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpsError {
    #[error("root object {id} could not be retrieved: {message}")]
    RootUnavailable { id: String, message: String },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("missing component: {component}")]
    MissingComponent { component: String },
}

impl UserFacingError for OpsError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::RootUnavailable { .. } => {
                Some("Check the object id, the server base URL and the auth token.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::RootUnavailable { .. } => "ops.root_unavailable",
            Self::InvalidRequest { .. } => "ops.invalid_request",
            Self::MissingComponent { .. } => "ops.missing_component",
        })
    }
}
