//! Integration tests for config

#[cfg(test)]
mod tests {
    use drs_config::*;
    use drs_hash::ChecksumAlgorithm;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: [&str; 6] = [
        "DRS_WORKERS",
        "DRS_RETRIES",
        "DRS_SUPPRESS_SSL_VERIFY",
        "DRS_OUTPUT_DIR",
        "DRS_CHECKSUM",
        "DRS_AUTH_TOKEN",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[general]
workers = 8

[network]
retries = 5
suppress_ssl_verify = true

[download]
output_dir = "/tmp/drs-out"
checksum = "md5"

[auth]
token = "secret"

[auth.headers]
X-Project = "demo"
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.general.workers, 8);
        assert_eq!(config.network.retries, 5);
        assert!(config.network.suppress_ssl_verify);
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/drs-out"));
        assert_eq!(
            config.checksum_preference().unwrap(),
            Some(ChecksumAlgorithm::Md5)
        );

        let headers = config.auth_headers();
        assert_eq!(headers.get("Authorization"), Some("Bearer secret"));
        assert_eq!(headers.get("x-project"), Some("demo"));
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let result = Config::load_from_file(std::path::Path::new("/nonexistent/drs.toml")).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.general.workers, 4);
        assert_eq!(config.network.retries, 3);
        assert!(config.auth_headers().is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("DRS_WORKERS", "2");
        std::env::set_var("DRS_CHECKSUM", "sha-512");
        std::env::set_var("DRS_AUTH_TOKEN", "tok");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert_eq!(config.general.workers, 2);
        assert_eq!(
            config.checksum_preference().unwrap(),
            Some(ChecksumAlgorithm::Sha512)
        );
        assert_eq!(config.auth_headers().get("authorization"), Some("Bearer tok"));

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("DRS_WORKERS", "many");

        let mut config = Config::default();
        assert!(config.merge_env().is_err());

        clear_env();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.general.workers = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.download.checksum = Some("crc32c".to_string());
        assert!(config.validate().is_err());
    }
}
