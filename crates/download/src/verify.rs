//! Checksum selection and comparison

use drs_hash::{Checksum, ChecksumAlgorithm};
use drs_types::{Blob, ChecksumStatus};

/// A declared digest this client can check
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Expected {
    pub algorithm: ChecksumAlgorithm,
    pub value: String,
}

/// Declared checksums to check for `blob`
///
/// With a preference that the blob declares, only that algorithm is
/// checked. Otherwise every supported declared entry is.
pub(crate) fn expected_checksums(
    blob: &Blob,
    preference: Option<ChecksumAlgorithm>,
) -> Vec<Expected> {
    let supported: Vec<Expected> = blob
        .checksums
        .iter()
        .filter_map(|declared| {
            declared.algorithm().map(|algorithm| Expected {
                algorithm,
                value: declared.value.clone(),
            })
        })
        .collect();

    match preference {
        Some(preferred) if supported.iter().any(|e| e.algorithm == preferred) => supported
            .into_iter()
            .filter(|e| e.algorithm == preferred)
            .collect(),
        _ => supported,
    }
}

/// Compare computed digests against the expected ones
pub(crate) fn compare(expected: &[Expected], computed: &[Checksum]) -> ChecksumStatus {
    if expected.is_empty() {
        return ChecksumStatus::Unverified;
    }

    let mut algorithms = Vec::new();
    for entry in expected {
        let Some(actual) = computed.iter().find(|c| c.algorithm == entry.algorithm) else {
            return ChecksumStatus::NotComputed;
        };
        if !actual.matches_hex(&entry.value) {
            return ChecksumStatus::Mismatch {
                algorithm: entry.algorithm,
                expected: entry.value.clone(),
                actual: actual.to_hex().to_string(),
            };
        }
        if !algorithms.contains(&entry.algorithm) {
            algorithms.push(entry.algorithm);
        }
    }
    ChecksumStatus::Verified { algorithms }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drs_types::DeclaredChecksum;

    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
    const HELLO_MD5: &str = "5eb63bbbe01eeed093cb22bb8f5acdc3";

    fn blob(checksums: &[(&str, &str)]) -> Blob {
        Blob {
            id: "obj".into(),
            name: None,
            size: 11,
            checksums: checksums
                .iter()
                .map(|(kind, value)| DeclaredChecksum {
                    kind: (*kind).to_string(),
                    value: (*value).to_string(),
                })
                .collect(),
            access_methods: Vec::new(),
        }
    }

    fn computed() -> Vec<Checksum> {
        vec![
            Checksum::from_data(ChecksumAlgorithm::Sha256, b"hello world"),
            Checksum::from_data(ChecksumAlgorithm::Md5, b"hello world"),
        ]
    }

    #[test]
    fn test_all_supported_declared_are_checked() {
        let blob = blob(&[("sha-256", HELLO_SHA256), ("md5", HELLO_MD5), ("etag", "zzz")]);
        let expected = expected_checksums(&blob, None);
        assert_eq!(expected.len(), 2);
        assert_eq!(
            compare(&expected, &computed()),
            ChecksumStatus::Verified {
                algorithms: vec![ChecksumAlgorithm::Sha256, ChecksumAlgorithm::Md5]
            }
        );
    }

    #[test]
    fn test_preference_narrows_the_check() {
        let blob = blob(&[("sha-256", HELLO_SHA256), ("md5", "00000000")]);
        let expected = expected_checksums(&blob, Some(ChecksumAlgorithm::Sha256));
        assert_eq!(expected.len(), 1);
        assert!(matches!(
            compare(&expected, &computed()),
            ChecksumStatus::Verified { .. }
        ));

        // An undeclared preference falls back to everything declared
        let expected = expected_checksums(&blob, Some(ChecksumAlgorithm::Sha512));
        assert_eq!(expected.len(), 2);
        assert!(matches!(
            compare(&expected, &computed()),
            ChecksumStatus::Mismatch {
                algorithm: ChecksumAlgorithm::Md5,
                ..
            }
        ));
    }

    #[test]
    fn test_unsupported_only_is_unverified() {
        let blob = blob(&[("crc32c", "abcd")]);
        let expected = expected_checksums(&blob, None);
        assert_eq!(compare(&expected, &computed()), ChecksumStatus::Unverified);
    }
}
