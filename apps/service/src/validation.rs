use url::Url;

use crate::error::ResourceError;
use crate::monitoring::types::ResourceId;

/// Longest url the store accepts
pub const MAX_URL_LENGTH: usize = 255;

/// Validate an HTTP/HTTPS resource url and return its normalised form
pub fn validate_http_endpoint(target: &str) -> Result<String, ResourceError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(ResourceError::InvalidUrl("url cannot be empty".into()));
    }

    let url = Url::parse(target).map_err(|e| {
        if !target.contains("://") {
            ResourceError::InvalidUrl("url must include scheme (http:// or https://)".into())
        } else {
            ResourceError::InvalidUrl(format!("{e}"))
        }
    })?;

    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ResourceError::InvalidUrl(format!(
            "invalid scheme '{scheme}', must be http or https"
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ResourceError::InvalidUrl("url must have a valid host".into()));
    }

    let normalised = url.to_string();
    if normalised.len() > MAX_URL_LENGTH {
        return Err(ResourceError::InvalidUrl(format!(
            "url is longer than {MAX_URL_LENGTH} characters"
        )));
    }

    Ok(normalised)
}

/// Reject ids outside the 32-bit domain before they reach storage
pub fn validate_resource_id(raw: i64) -> Result<ResourceId, ResourceError> {
    i32::try_from(raw).map(ResourceId::from).map_err(|_| ResourceError::OutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert_eq!(validate_http_endpoint("https://example.com").unwrap(), "https://example.com/");
        assert!(validate_http_endpoint(" http://example.com:8080/health ").is_ok());
    }

    #[test]
    fn rejects_malformed_urls() {
        for bad in ["", "   ", "example.com", "ftp://example.com", "http://", "not a url"] {
            assert!(
                matches!(validate_http_endpoint(bad), Err(ResourceError::InvalidUrl(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_overlong_urls() {
        let long = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert!(matches!(validate_http_endpoint(&long), Err(ResourceError::InvalidUrl(_))));
    }

    #[test]
    fn ids_beyond_32_bits_are_out_of_range() {
        assert_eq!(validate_resource_id(1).unwrap(), 1);
        assert_eq!(validate_resource_id(i32::MAX as i64).unwrap(), i32::MAX as i64);
        assert!(matches!(validate_resource_id(1 << 32), Err(ResourceError::OutOfRange)));
        assert!(matches!(validate_resource_id(i32::MAX as i64 + 1), Err(ResourceError::OutOfRange)));
    }
}
