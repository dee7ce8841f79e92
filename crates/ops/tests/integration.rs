//! Integration tests for ops crate

#[cfg(test)]
mod tests {
    use drs_errors::{Error, MetadataError, OpsError};
    use drs_events::{channel, AppEvent, EventReceiver, GeneralEvent};
    use drs_hash::{Checksum, ChecksumAlgorithm};
    use drs_net::memory::MemoryTransport;
    use drs_ops::*;
    use drs_types::{FailureReason, Outcome};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn sha256(body: &[u8]) -> String {
        Checksum::from_data(ChecksumAlgorithm::Sha256, body)
            .to_hex()
            .to_string()
    }

    fn blob_doc(id: &str, body: &[u8]) -> Value {
        json!({
            "id": id,
            "name": format!("{id}.txt"),
            "size": body.len(),
            "checksums": [{"type": "sha-256", "checksum": sha256(body)}],
            "access_methods": [{"type": "https", "access_url": {"url": format!("https://data.example.org/{id}")}}]
        })
    }

    fn bundle_doc(id: &str, children: &[&str]) -> Value {
        let contents: Vec<Value> = children.iter().map(|c| json!({"id": c, "name": c})).collect();
        json!({"id": id, "name": id, "contents": contents})
    }

    fn context(transport: &Arc<MemoryTransport>) -> (OpsCtx, EventReceiver) {
        let (tx, rx) = channel();
        let ctx = OpsContextBuilder::new()
            .with_transport(transport.clone())
            .with_event_sender(tx)
            .build()
            .unwrap();
        (ctx, rx)
    }

    #[tokio::test]
    async fn test_metadata_only_returns_pretty_document() {
        let transport = Arc::new(MemoryTransport::new());
        transport.add_object("obj2", blob_doc("obj2", b"hello"));
        let (ctx, _rx) = context(&transport);

        let outcome = get(&ctx, &GetRequest::metadata("obj2")).await.unwrap();

        assert!(outcome.report.is_none());
        assert!(outcome.is_success());
        assert!(outcome.metadata.contains("\n    \"id\": \"obj2\""));
        assert_eq!(transport.byte_fetches("https://data.example.org/obj2"), 0);
    }

    #[tokio::test]
    async fn test_unreachable_root_is_fatal() {
        let transport = Arc::new(MemoryTransport::new());
        transport.fail_object("missing", 404);
        let (ctx, mut rx) = context(&transport);
        let dir = tempdir().unwrap();

        let request = GetRequest::metadata("missing").with_download(dir.path());
        let err = get(&ctx, &request).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Ops(OpsError::RootUnavailable { ref id, .. }) if id == "missing"
        ));
        let mut failed = false;
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::General(GeneralEvent::OperationFailed { .. }) = event {
                failed = true;
            }
        }
        assert!(failed);
    }

    #[tokio::test]
    async fn test_empty_object_id_is_rejected() {
        let transport = Arc::new(MemoryTransport::new());
        let (ctx, _rx) = context(&transport);

        let err = get(&ctx, &GetRequest::metadata("  ")).await.unwrap_err();
        assert!(matches!(err, Error::Ops(OpsError::InvalidRequest { .. })));
    }

    #[tokio::test]
    async fn test_blob_root_downloads_one_object() {
        let transport = Arc::new(MemoryTransport::new());
        transport.add_object("obj2", blob_doc("obj2", b"hello"));
        transport.add_body("https://data.example.org/obj2", b"hello".to_vec());
        let (ctx, _rx) = context(&transport);
        let dir = tempdir().unwrap();

        let request = GetRequest::metadata("obj2").with_download(dir.path());
        let outcome = get(&ctx, &request).await.unwrap();

        let report = outcome.report.as_ref().unwrap();
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.succeeded, 1);
        assert!(outcome.is_success());
        let written = tokio::fs::read(dir.path().join("obj2")).await.unwrap();
        assert_eq!(written, b"hello");
    }

    #[tokio::test]
    async fn test_bundle_root_reports_mismatch_per_object() {
        let transport = Arc::new(MemoryTransport::new());
        transport.add_object("obj1", bundle_doc("obj1", &["obj2", "bundle3"]));
        transport.add_object("obj2", blob_doc("obj2", b"AAA"));
        transport.add_object("bundle3", bundle_doc("bundle3", &["obj4"]));
        transport.add_object("obj4", blob_doc("obj4", b"BBB"));
        transport.add_body("https://data.example.org/obj2", b"AAA".to_vec());
        transport.add_body("https://data.example.org/obj4", b"XXX".to_vec());
        let (ctx, _rx) = context(&transport);
        let dir = tempdir().unwrap();

        let request = GetRequest::metadata("obj1").with_download(dir.path());
        let outcome = get(&ctx, &request).await.unwrap();
        let report = outcome.report.as_ref().unwrap();

        let ids: Vec<&str> = report.entries.iter().map(|e| e.object_id.as_str()).collect();
        assert_eq!(ids, vec!["obj2", "obj4"]);
        assert!(report.entries[0].outcome.is_success());
        assert!(matches!(
            report.entries[1].outcome,
            Outcome::Failed {
                reason: FailureReason::ChecksumMismatch { .. }
            }
        ));
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_lost_branch_fails_the_outcome() {
        let transport = Arc::new(MemoryTransport::new());
        transport.add_object("root", bundle_doc("root", &["ok", "gone"]));
        transport.add_object("ok", blob_doc("ok", b"fine"));
        transport.add_body("https://data.example.org/ok", b"fine".to_vec());
        transport.fail_object("gone", 500);
        let (ctx, _rx) = context(&transport);
        let dir = tempdir().unwrap();

        let request = GetRequest::metadata("root").with_download(dir.path());
        let outcome = get(&ctx, &request).await.unwrap();
        let report = outcome.report.as_ref().unwrap();

        assert_eq!(report.failed, 0);
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].is_error());
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_download_of_invalid_root_is_a_metadata_error() {
        let transport = Arc::new(MemoryTransport::new());
        transport.add_object("odd", json!({"id": "odd"}));
        let (ctx, _rx) = context(&transport);
        let dir = tempdir().unwrap();

        let metadata = get(&ctx, &GetRequest::metadata("odd")).await;
        assert!(metadata.is_ok());

        let request = GetRequest::metadata("odd").with_download(dir.path());
        let err = get(&ctx, &request).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Metadata(MetadataError::UnclassifiedObject { .. })
        ));
    }

    #[tokio::test]
    async fn test_operation_events_bracket_the_run() {
        let transport = Arc::new(MemoryTransport::new());
        transport.add_object("obj2", blob_doc("obj2", b"hello"));
        let (ctx, mut rx) = context(&transport);

        get(&ctx, &GetRequest::metadata("obj2")).await.unwrap();

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                AppEvent::General(GeneralEvent::OperationStarted { .. }) => seen.push("started"),
                AppEvent::General(GeneralEvent::OperationCompleted { success, .. }) => {
                    assert!(success);
                    seen.push("completed");
                }
                _ => {}
            }
        }
        assert_eq!(seen, vec!["started", "completed"]);
    }

    #[test]
    fn test_builder_requires_transport() {
        let (tx, _rx) = channel();
        let result = OpsContextBuilder::new().with_event_sender(tx).build();
        assert!(matches!(
            result,
            Err(Error::Ops(OpsError::MissingComponent { .. }))
        ));
    }
}
