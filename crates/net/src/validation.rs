//! Server URL validation

use drs_errors::{Error, NetworkError};
use url::Url;

/// URL schemes accepted for the server and for access URLs
pub const SUPPORTED_SCHEMES: [&str; 2] = ["http", "https"];

/// Validate a DRS server base URL
///
/// # Errors
///
/// Returns an error if the URL is malformed, has no host, or uses a scheme
/// other than http or https.
pub fn validate_url(url: &str) -> Result<Url, Error> {
    let parsed = Url::parse(url).map_err(|e| NetworkError::InvalidUrl(format!("{url}: {e}")))?;

    if !SUPPORTED_SCHEMES.contains(&parsed.scheme()) {
        return Err(NetworkError::UnsupportedProtocol {
            protocol: parsed.scheme().to_string(),
        }
        .into());
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(NetworkError::InvalidUrl(format!("{url}: missing host")).into());
    }

    Ok(parsed)
}

/// Append path segments to a base URL, percent-encoding each one
pub(crate) fn join_segments<'a>(
    base: &Url,
    segments: impl IntoIterator<Item = &'a str>,
) -> Result<Url, Error> {
    let mut url = base.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|()| NetworkError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(validate_url("https://drs.example.org").is_ok());
        assert!(validate_url("http://localhost:8080/prefix").is_ok());
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(validate_url("not a url").is_err());
        assert!(matches!(
            validate_url("ftp://drs.example.org"),
            Err(Error::Network(NetworkError::UnsupportedProtocol { .. }))
        ));
    }

    #[test]
    fn test_join_segments_encodes_ids() {
        let base = validate_url("https://drs.example.org/api/").unwrap();
        let url = join_segments(&base, ["ga4gh", "drs", "v1", "objects", "a/b c"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://drs.example.org/api/ga4gh/drs/v1/objects/a%2Fb%20c"
        );
    }
}
