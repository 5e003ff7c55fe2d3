//! Error types for IndexNow submission.
//!
//! This module defines structured errors for all submission operations,
//! providing context-rich error messages for debugging and user feedback.

use thiserror::Error;

/// Errors that can occur while submitting URL batches to an IndexNow endpoint.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error submitting to {endpoint}: {source}")]
    Network {
        /// The endpoint host that failed.
        endpoint: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout submitting to {endpoint}")]
    Timeout {
        /// The endpoint host that timed out.
        endpoint: String,
    },

    /// HTTP error response from the indexing endpoint.
    ///
    /// Per the IndexNow protocol: 400 means the payload was malformed,
    /// 403 means the key was not found at the key location, 422 means the
    /// URLs do not belong to the host or the key does not match the schema,
    /// 429 means too many requests.
    #[error("HTTP {status} from {endpoint}")]
    HttpStatus {
        /// The endpoint host that returned an error status.
        endpoint: String,
        /// The HTTP status code.
        status: u16,
        /// The Retry-After header value, if present (for 429 responses).
        retry_after: Option<String>,
    },

    /// The API key was rejected by the endpoint (HTTP 403).
    ///
    /// The endpoint fetched the key file from the key location and it was
    /// missing or did not match. Retrying without fixing the key is futile.
    #[error(
        "key rejected by {endpoint} (HTTP 403)\n  Suggestion: verify that {key_location} serves the key"
    )]
    KeyRejected {
        /// The endpoint host that rejected the key.
        endpoint: String,
        /// Where the endpoint expected to find the key file.
        key_location: String,
    },

    /// A URL in the batch is malformed or does not belong to the configured host.
    #[error("invalid URL for host {host}: {url}")]
    InvalidUrl {
        /// The offending URL string.
        url: String,
        /// The host the submission is configured for.
        host: String,
    },

    /// The submission configuration itself is unusable (empty key, bad host).
    #[error("invalid submission config: {reason}")]
    InvalidConfig {
        /// Why the configuration was rejected.
        reason: String,
    },
}

impl SubmitError {
    /// Creates a network error from a reqwest error.
    pub fn network(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(endpoint: impl Into<String>) -> Self {
        Self::Timeout {
            endpoint: endpoint.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(endpoint: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            endpoint: endpoint.into(),
            status,
            retry_after: None,
        }
    }

    /// Creates an HTTP status error with a Retry-After header value.
    pub fn http_status_with_retry_after(
        endpoint: impl Into<String>,
        status: u16,
        retry_after: Option<String>,
    ) -> Self {
        Self::HttpStatus {
            endpoint: endpoint.into(),
            status,
            retry_after,
        }
    }

    /// Creates a key-rejected error.
    pub fn key_rejected(endpoint: impl Into<String>, key_location: impl Into<String>) -> Self {
        Self::KeyRejected {
            endpoint: endpoint.into(),
            key_location: key_location.into(),
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>, host: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            host: host.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

// Note on From trait implementations:
// We intentionally do NOT implement `From<reqwest::Error>` because our error
// variants require context (endpoint, host) that the source errors don't
// provide. The helper constructor methods are the correct pattern here as
// they allow callers to provide the necessary context.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_error_timeout_display() {
        let error = SubmitError::timeout("api.indexnow.org");
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("api.indexnow.org"));
    }

    #[test]
    fn test_submit_error_http_status_display() {
        let error = SubmitError::http_status("www.bing.com", 422);
        let msg = error.to_string();
        assert!(msg.contains("422"), "Expected '422' in: {msg}");
        assert!(msg.contains("www.bing.com"), "Expected endpoint in: {msg}");
    }

    #[test]
    fn test_submit_error_key_rejected_display() {
        let error = SubmitError::key_rejected(
            "yandex.com",
            "https://toolslab.dev/0123456789abcdef.txt",
        );
        let msg = error.to_string();
        assert!(msg.contains("key rejected"), "Expected phrase in: {msg}");
        assert!(msg.contains("403"), "Expected status in: {msg}");
        assert!(msg.contains("Suggestion"), "Expected suggestion in: {msg}");
        assert!(
            msg.contains("0123456789abcdef.txt"),
            "Expected key location in: {msg}"
        );
    }

    #[test]
    fn test_submit_error_invalid_url_display() {
        let error = SubmitError::invalid_url("https://other.com/page", "toolslab.dev");
        let msg = error.to_string();
        assert!(msg.contains("invalid URL"), "Expected phrase in: {msg}");
        assert!(msg.contains("other.com"), "Expected URL in: {msg}");
        assert!(msg.contains("toolslab.dev"), "Expected host in: {msg}");
    }

    #[test]
    fn test_submit_error_invalid_config_display() {
        let error = SubmitError::invalid_config("key must not be empty");
        assert!(error.to_string().contains("key must not be empty"));
    }

    #[test]
    fn test_submit_error_http_status_with_retry_after() {
        let error = SubmitError::http_status_with_retry_after(
            "api.indexnow.org",
            429,
            Some("120".to_string()),
        );
        match error {
            SubmitError::HttpStatus {
                status, retry_after, ..
            } => {
                assert_eq!(status, 429);
                assert_eq!(retry_after.as_deref(), Some("120"));
            }
            other => panic!("Expected HttpStatus, got: {other:?}"),
        }
    }
}
