//! Integration tests for types

#[cfg(test)]
mod tests {
    use drs_types::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_scenario_root_bundle() {
        let bytes = br#"{
            "id": "obj1",
            "name": "root",
            "contents": [
                {"id": "obj2", "name": "obj2.txt"},
                {"id": "bundle3", "name": "nested"}
            ]
        }"#;
        let object = DrsObject::from_slice(bytes).unwrap();
        let DrsObject::Bundle(bundle) = object else {
            panic!("expected bundle");
        };
        let ids: Vec<&str> = bundle.contents.iter().map(ContentRef::id).collect();
        assert_eq!(ids, vec!["obj2", "bundle3"]);
    }

    #[test]
    fn test_invalid_json_is_metadata_error() {
        let err = DrsObject::from_slice(b"not json").unwrap_err();
        assert!(matches!(err, drs_errors::MetadataError::InvalidJson { .. }));
    }

    proptest! {
        #[test]
        fn prop_bundle_contents_keep_listed_order(ids in prop::collection::vec("[a-z0-9]{1,12}", 0..20)) {
            let contents: Vec<_> = ids.iter().map(|id| json!({"id": id})).collect();
            let doc = json!({"id": "root", "contents": contents});
            let object = DrsObject::from_json(doc).unwrap();
            let DrsObject::Bundle(bundle) = object else {
                panic!("expected bundle");
            };
            let parsed: Vec<String> = bundle.contents.iter().map(|c| c.id().to_string()).collect();
            prop_assert_eq!(parsed, ids);
        }

        #[test]
        fn prop_blob_fields_survive_parsing(
            id in "[A-Za-z0-9._-]{1,24}",
            size in any::<u64>(),
            checksum in "[0-9a-f]{64}",
        ) {
            let doc = json!({
                "id": id,
                "size": size,
                "checksums": [{"type": "sha-256", "checksum": checksum}],
                "access_methods": [{"type": "https", "access_url": {"url": "https://x/y"}}]
            });
            let object = DrsObject::from_json(doc).unwrap();
            let DrsObject::Blob(blob) = object else {
                panic!("expected blob");
            };
            prop_assert_eq!(blob.id, id);
            prop_assert_eq!(blob.size, size);
            prop_assert_eq!(&blob.checksums[0].value, &checksum);
        }
    }
}
