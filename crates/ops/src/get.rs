//! The `get` operation

use crate::{GetOutcome, GetRequest, OpsCtx};
use drs_download::{AccessContext, DataAccessor, DownloadManager};
use drs_errors::{Error, MetadataError, OpsError};
use drs_events::EventEmitter;
use drs_resolver::BundleResolver;
use drs_types::{DrsObject, Report};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Fetch an object's metadata and optionally download its data
///
/// Only failures before any download starts are errors. Once the root is
/// known every per-object failure ends up in the report instead.
///
/// # Errors
///
/// Returns an error if the object id is empty, the root metadata cannot be
/// retrieved, or a download was requested and the root document is not a
/// valid DRS object.
pub async fn get(ctx: &OpsCtx, request: &GetRequest) -> Result<GetOutcome, Error> {
    let operation = format!("get {}", request.object_id);
    ctx.emit_operation_started(&operation);

    match run(ctx, request).await {
        Ok(outcome) => {
            ctx.emit_operation_completed(&operation, outcome.is_success());
            Ok(outcome)
        }
        Err(e) => {
            ctx.emit_operation_failed(&operation, e.to_string());
            Err(e)
        }
    }
}

async fn run(ctx: &OpsCtx, request: &GetRequest) -> Result<GetOutcome, Error> {
    if request.object_id.trim().is_empty() {
        return Err(OpsError::InvalidRequest {
            message: "object id must not be empty".to_string(),
        }
        .into());
    }

    let document = ctx
        .transport
        .fetch_object(&request.object_id, request.expand, &ctx.headers)
        .await
        .map_err(|e| OpsError::RootUnavailable {
            id: request.object_id.clone(),
            message: e.to_string(),
        })?;

    let metadata = pretty_json(&document)?;

    let report = if request.download {
        let root = DrsObject::from_json(document)?;
        Some(download(ctx, root, &request.output_dir).await)
    } else {
        None
    };

    Ok(GetOutcome { metadata, report })
}

/// Four-space indented JSON
fn pretty_json(document: &Value) -> Result<String, Error> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut out, formatter);
    document
        .serialize(&mut serializer)
        .map_err(|e| MetadataError::InvalidJson {
            message: e.to_string(),
        })?;
    String::from_utf8(out).map_err(|e| {
        MetadataError::InvalidJson {
            message: e.to_string(),
        }
        .into()
    })
}

async fn download(ctx: &OpsCtx, root: DrsObject, output_dir: &Path) -> Report {
    let (accessors, issues) = match root {
        DrsObject::Blob(blob) => (
            vec![DataAccessor::new(
                Arc::new(blob),
                output_dir,
                ctx.headers.clone(),
            )],
            Vec::new(),
        ),
        DrsObject::Bundle(bundle) => {
            BundleResolver::new(Arc::clone(&ctx.transport), ctx.headers.clone())
                .with_event_sender(ctx.tx.clone())
                .resolve(&bundle)
                .await
                .into_accessors(output_dir, &ctx.headers)
        }
    };

    let access = AccessContext::new(Arc::clone(&ctx.transport), ctx.transfer.clone())
        .with_event_sender(ctx.tx.clone());
    DownloadManager::new(access)
        .run(accessors)
        .await
        .with_issues(issues)
}
