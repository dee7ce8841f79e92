//! Structured logging integration for events
//!
//! Library crates report progress as [`AppEvent`]s. This module installs the
//! tracing subscriber and turns each event into a log record with structured
//! fields.

use crate::cli::GlobalArgs;
use crate::error::CliError;
use drs_events::{AppEvent, DownloadEvent, GeneralEvent, ResolverEvent};
use std::fs::File;
use std::sync::Mutex;
use tracing::{debug, error, info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Default filter for a `-v` count
fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initialize tracing/logging
///
/// `RUST_LOG` overrides the level picked from `-v`. `--silent` turns logging
/// off entirely.
pub fn init_tracing(global: &GlobalArgs) -> Result<(), CliError> {
    let filter = if global.silent {
        EnvFilter::new("off")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(global.verbose)))
    };

    let writer = match &global.logfile {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                CliError::Setup(format!("cannot open log file {}: {e}", path.display()))
            })?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(global.logfile.is_none() && !global.json);

    let installed = if global.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| CliError::Setup(e.to_string()))
}

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(event: &AppEvent) {
    let source = event.event_source();
    let source = source.as_str();

    match event {
        AppEvent::General(general) => match general {
            GeneralEvent::Warning { message, context } => {
                warn!(target: "drs::events::general", source, context = ?context, "{message}");
            }
            GeneralEvent::Error { message, details } => {
                error!(target: "drs::events::general", source, details = ?details, "{message}");
            }
            GeneralEvent::DebugLog { message, context } => {
                debug!(target: "drs::events::general", source, context = ?context, "{message}");
            }
            GeneralEvent::OperationStarted { operation } => {
                info!(target: "drs::events::general", source, operation = %operation, "Operation started");
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                info!(
                    target: "drs::events::general",
                    source,
                    operation = %operation,
                    success,
                    "Operation completed"
                );
            }
            GeneralEvent::OperationFailed { operation, error } => {
                error!(
                    target: "drs::events::general",
                    source,
                    operation = %operation,
                    error = %error,
                    "Operation failed"
                );
            }
        },

        AppEvent::Resolver(resolver) => match resolver {
            ResolverEvent::Started { root_id } => {
                info!(target: "drs::events::resolver", source, root_id = %root_id, "Resolving bundle");
            }
            ResolverEvent::ObjectFetched {
                id,
                parent_id,
                is_bundle,
            } => {
                debug!(
                    target: "drs::events::resolver",
                    source,
                    id = %id,
                    parent_id = %parent_id,
                    is_bundle,
                    "Fetched nested object"
                );
            }
            ResolverEvent::DuplicateSkipped { id, parent_id } => {
                warn!(
                    target: "drs::events::resolver",
                    source,
                    id = %id,
                    parent_id = %parent_id,
                    "Object already visited, skipping (cycle or duplicate)"
                );
            }
            ResolverEvent::BranchFailed {
                id,
                parent_id,
                failure,
            } => {
                error!(
                    target: "drs::events::resolver",
                    source,
                    id = %id,
                    parent_id = %parent_id,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Bundle branch could not be resolved"
                );
            }
            ResolverEvent::Completed {
                root_id,
                leaves,
                warnings,
                branch_errors,
            } => {
                info!(
                    target: "drs::events::resolver",
                    source,
                    root_id = %root_id,
                    leaves,
                    warnings,
                    branch_errors,
                    "Bundle resolved"
                );
            }
        },

        AppEvent::Download(download) => match download {
            DownloadEvent::PoolStarted { workers, accessors } => {
                info!(target: "drs::events::download", source, workers, accessors, "Starting downloads");
            }
            DownloadEvent::Queued {
                object_id,
                queue_position,
            } => {
                debug!(
                    target: "drs::events::download",
                    source,
                    object_id = %object_id,
                    queue_position,
                    "Download queued"
                );
            }
            DownloadEvent::Started {
                object_id,
                url,
                attempt,
                total_size,
            } => {
                debug!(
                    target: "drs::events::download",
                    source,
                    object_id = %object_id,
                    url = %url,
                    attempt,
                    total_size = ?total_size,
                    "Download started"
                );
            }
            DownloadEvent::Retrying {
                object_id,
                attempt,
                max_attempts,
                reason,
                backoff_delay,
            } => {
                warn!(
                    target: "drs::events::download",
                    source,
                    object_id = %object_id,
                    attempt,
                    max_attempts,
                    reason = %reason,
                    backoff_ms = u64::try_from(backoff_delay.as_millis()).unwrap_or(u64::MAX),
                    "Retrying download"
                );
            }
            DownloadEvent::ChecksumUnverified {
                object_id,
                declared,
            } => {
                warn!(
                    target: "drs::events::download",
                    source,
                    object_id = %object_id,
                    declared = ?declared,
                    "No supported checksum declared, download not verified"
                );
            }
            DownloadEvent::Completed {
                object_id,
                bytes_written,
                elapsed,
            } => {
                info!(
                    target: "drs::events::download",
                    source,
                    object_id = %object_id,
                    bytes_written,
                    elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                    "Download completed"
                );
            }
            DownloadEvent::Failed {
                object_id,
                reason,
                failure,
            } => {
                error!(
                    target: "drs::events::download",
                    source,
                    object_id = %object_id,
                    reason = %reason,
                    code = ?failure.as_ref().and_then(|f| f.code.as_deref()),
                    hint = ?failure.as_ref().and_then(|f| f.hint.as_deref()),
                    "Download failed"
                );
            }
            DownloadEvent::PoolFinished {
                succeeded,
                failed,
                elapsed,
            } => {
                info!(
                    target: "drs::events::download",
                    source,
                    succeeded,
                    failed,
                    elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                    "All downloads finished"
                );
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_maps_to_levels() {
        assert_eq!(default_directive(0), "warn");
        assert_eq!(default_directive(1), "info");
        assert_eq!(default_directive(2), "debug");
        assert_eq!(default_directive(9), "trace");
    }
}
