//! Integration tests for hash crate

#[cfg(test)]
mod tests {
    use drs_hash::*;

    #[test]
    fn test_empty_input_digests() {
        let sums = MultiHasher::new(ChecksumAlgorithm::ALL).finalize();
        let md5 = sums
            .iter()
            .find(|c| c.algorithm == ChecksumAlgorithm::Md5)
            .unwrap();
        assert_eq!(md5.to_hex(), "d41d8cd98f00b204e9800998ecf8427e");
        let sha = sums
            .iter()
            .find(|c| c.algorithm == ChecksumAlgorithm::Sha256)
            .unwrap();
        assert_eq!(
            sha.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_checksum_display_names_algorithm() {
        let md5 = Checksum::from_data(ChecksumAlgorithm::Md5, b"");
        assert_eq!(md5.to_string(), "md5:d41d8cd98f00b204e9800998ecf8427e");
    }
}
