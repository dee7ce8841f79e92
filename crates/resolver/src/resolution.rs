//! Result of walking a bundle

use drs_download::DataAccessor;
use drs_types::{AuthHeaders, Blob, ResolutionIssue};
use std::path::Path;
use std::sync::Arc;

/// Leaves in first-discovery order plus everything that went wrong on the way
#[derive(Clone, Debug, Default)]
pub struct Resolution {
    pub leaves: Vec<Arc<Blob>>,
    pub issues: Vec<ResolutionIssue>,
}

impl Resolution {
    /// Ids of the leaves, in order
    #[must_use]
    pub fn leaf_ids(&self) -> Vec<&str> {
        self.leaves.iter().map(|b| b.id.as_str()).collect()
    }

    /// Cycle and duplicate warnings
    #[must_use]
    pub fn warnings(&self) -> usize {
        self.issues.iter().filter(|i| !i.is_error()).count()
    }

    /// Branches skipped because they could not be fetched or parsed
    #[must_use]
    pub fn branch_errors(&self) -> usize {
        self.issues.iter().filter(|i| i.is_error()).count()
    }

    /// One accessor per leaf, writing into `output_dir`
    #[must_use]
    pub fn into_accessors(
        self,
        output_dir: &Path,
        headers: &AuthHeaders,
    ) -> (Vec<DataAccessor>, Vec<ResolutionIssue>) {
        let accessors = self
            .leaves
            .into_iter()
            .map(|blob| DataAccessor::new(blob, output_dir, headers.clone()))
            .collect();
        (accessors, self.issues)
    }
}
