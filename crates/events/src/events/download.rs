use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::FailureContext;

/// Download-specific events for the event system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DownloadEvent {
    /// Worker pool started
    PoolStarted { workers: usize, accessors: usize },

    /// Accessor queued for processing
    Queued {
        object_id: String,
        queue_position: usize,
    },

    /// Transfer attempt started
    Started {
        object_id: String,
        url: String,
        attempt: u32,
        total_size: Option<u64>,
    },

    /// Transfer retrying after a transient failure
    Retrying {
        object_id: String,
        attempt: u32,
        max_attempts: u32,
        reason: String,
        backoff_delay: Duration,
    },

    /// None of the declared checksum algorithms could be checked
    ChecksumUnverified {
        object_id: String,
        declared: Vec<String>,
    },

    /// Object written and verified
    Completed {
        object_id: String,
        bytes_written: u64,
        elapsed: Duration,
    },

    /// Object reached a failed terminal outcome
    Failed {
        object_id: String,
        reason: String,
        failure: Option<FailureContext>,
    },

    /// All accessors reached a terminal outcome
    PoolFinished {
        succeeded: usize,
        failed: usize,
        elapsed: Duration,
    },
}
