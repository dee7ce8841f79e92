use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Bundle traversal events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResolverEvent {
    /// Traversal of a root bundle started
    Started { root_id: String },

    /// A by-id content reference was fetched and classified
    ObjectFetched {
        id: String,
        parent_id: String,
        is_bundle: bool,
    },

    /// A reference to an already visited object was skipped
    DuplicateSkipped { id: String, parent_id: String },

    /// A nested reference could not be fetched or parsed; its branch was skipped
    BranchFailed {
        id: String,
        parent_id: String,
        failure: FailureContext,
    },

    /// Traversal finished
    Completed {
        root_id: String,
        leaves: usize,
        warnings: usize,
        branch_errors: usize,
    },
}
