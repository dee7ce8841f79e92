//! Bounded worker pool running accessors to completion

use crate::accessor::{AccessContext, DataAccessor};
use crossbeam::queue::SegQueue;
use dashmap::DashMap;
use drs_events::{AppEvent, DownloadEvent, EventEmitter};
use drs_types::{ChecksumStatus, FailureReason, Outcome, Report, ReportEntry};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Runs every submitted accessor exactly once across `workers` tasks
///
/// A failing accessor never stops the others, even one that panics: the panic
/// is caught around that accessor alone and its worker keeps pulling work.
/// The report lists one entry per accessor in submission order, whatever
/// order they finished in.
pub struct DownloadManager {
    ctx: Arc<AccessContext>,
}

impl DownloadManager {
    #[must_use]
    pub fn new(ctx: AccessContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    /// Number of worker tasks used for `accessors` accessors
    #[must_use]
    pub fn pool_size(&self, accessors: usize) -> usize {
        self.ctx.config.workers.max(1).min(accessors)
    }

    /// Execute all accessors and build the report
    pub async fn run(&self, accessors: Vec<DataAccessor>) -> Report {
        let start = Instant::now();
        let workers = self.pool_size(accessors.len());
        self.ctx.emit(AppEvent::Download(DownloadEvent::PoolStarted {
            workers,
            accessors: accessors.len(),
        }));

        // Placeholders for accessors a dead worker never finished
        let mut unfinished = Vec::with_capacity(accessors.len());
        let queue = Arc::new(SegQueue::new());
        for (index, accessor) in accessors.into_iter().enumerate() {
            self.ctx.emit(AppEvent::Download(DownloadEvent::Queued {
                object_id: accessor.object_id().to_string(),
                queue_position: index,
            }));
            unfinished.push(failed_entry(
                &accessor,
                "worker exited before finishing this object".to_string(),
            ));
            queue.push((index, accessor));
        }

        let sink: Arc<DashMap<usize, ReportEntry>> = Arc::new(DashMap::new());
        let mut tasks = JoinSet::new();
        for _ in 0..workers {
            let queue = Arc::clone(&queue);
            let sink = Arc::clone(&sink);
            let ctx = Arc::clone(&self.ctx);
            tasks.spawn(async move {
                while let Some((index, mut accessor)) = queue.pop() {
                    let result = AssertUnwindSafe(accessor.execute(&ctx))
                        .catch_unwind()
                        .await;
                    let entry = match result {
                        Ok(entry) => entry,
                        Err(panic) => {
                            let message =
                                format!("download panicked: {}", panic_message(panic.as_ref()));
                            ctx.emit(AppEvent::Download(DownloadEvent::Failed {
                                object_id: accessor.object_id().to_string(),
                                reason: message.clone(),
                                failure: None,
                            }));
                            failed_entry(&accessor, message)
                        }
                    };
                    sink.insert(index, entry);
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                self.ctx.emit_error(format!("download worker exited abnormally: {e}"));
            }
        }

        let entries: Vec<ReportEntry> = unfinished
            .into_iter()
            .enumerate()
            .map(|(index, placeholder)| {
                sink.remove(&index)
                    .map_or(placeholder, |(_, entry)| entry)
            })
            .collect();

        let report = Report::new(entries, Vec::new());
        self.ctx.emit(AppEvent::Download(DownloadEvent::PoolFinished {
            succeeded: report.succeeded,
            failed: report.failed,
            elapsed: start.elapsed(),
        }));
        report
    }
}

fn failed_entry(accessor: &DataAccessor, message: String) -> ReportEntry {
    ReportEntry {
        object_id: accessor.object_id().to_string(),
        name: accessor.blob().name.clone(),
        destination: accessor.destination().to_path_buf(),
        bytes_written: 0,
        checksum: ChecksumStatus::NotComputed,
        elapsed_ms: 0,
        attempts: 0,
        outcome: Outcome::Failed {
            reason: FailureReason::Internal { message },
        },
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
