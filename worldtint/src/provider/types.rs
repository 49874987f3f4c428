//! Shared provider types.

use thiserror::Error;

/// HTTP status code for rate limiting.
const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Errors that can occur while talking to the imagery provider.
///
/// Transport-level failures (connect errors, timeouts) surface as
/// [`ProviderError::Transport`]; an HTTP response with a non-success
/// status is NOT an error at this layer: the retry policy needs to see
/// the status to decide how to react, so responses are returned whole as
/// [`HttpResponse`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    /// Network-level failure: connection, TLS, or timeout.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The identity provider rejected the credential exchange.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A response body could not be parsed as expected.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The HTTP client could not be constructed.
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),
}

/// A complete HTTP response: status code plus raw body bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// HTTP 429.
    pub fn is_rate_limited(&self) -> bool {
        self.status == STATUS_TOO_MANY_REQUESTS
    }

    /// Body as lossy UTF-8, for log messages.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_statuses() {
        assert!(HttpResponse { status: 200, body: vec![] }.is_success());
        assert!(HttpResponse { status: 204, body: vec![] }.is_success());
        assert!(!HttpResponse { status: 301, body: vec![] }.is_success());
        assert!(!HttpResponse { status: 429, body: vec![] }.is_success());
        assert!(!HttpResponse { status: 500, body: vec![] }.is_success());
    }

    #[test]
    fn test_rate_limited_only_for_429() {
        assert!(HttpResponse { status: 429, body: vec![] }.is_rate_limited());
        assert!(!HttpResponse { status: 503, body: vec![] }.is_rate_limited());
    }

    #[test]
    fn test_body_text_is_lossy() {
        let response = HttpResponse {
            status: 400,
            body: vec![b'o', b'k', 0xFF],
        };
        assert!(response.body_text().starts_with("ok"));
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "Transport failure: connection refused");

        let err = ProviderError::AuthenticationFailed("HTTP 401".to_string());
        assert!(err.to_string().contains("Authentication failed"));
    }
}
