//! HTTP client abstraction for testability.

use std::time::Duration;

use super::types::{HttpResponse, ProviderError};

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Trait for the two HTTP operations the providers need.
///
/// This abstraction allows dependency injection: tests substitute a
/// scripted client and assert on the requests that were made.
///
/// Implementations return `Ok` for any completed HTTP exchange,
/// whatever the status code; only transport-level failures are `Err`.
pub trait HttpClient: Send + Sync {
    /// POST a form-urlencoded body.
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse, ProviderError>;

    /// POST a JSON body with a bearer token.
    fn post_json(
        &self,
        url: &str,
        bearer_token: &str,
        body: &str,
    ) -> Result<HttpResponse, ProviderError>;
}

/// Real HTTP client implementation using blocking reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a new client with the default 60 second timeout.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new client with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }

    fn read_response(
        response: reqwest::blocking::Response,
    ) -> Result<HttpResponse, ProviderError> {
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| ProviderError::Transport(format!("Failed to read response: {}", e)))?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}

impl HttpClient for ReqwestClient {
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse, ProviderError> {
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .map_err(|e| ProviderError::Transport(format!("Request failed: {}", e)))?;

        Self::read_response(response)
    }

    fn post_json(
        &self,
        url: &str,
        bearer_token: &str,
        body: &str,
    ) -> Result<HttpResponse, ProviderError> {
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", bearer_token))
            .header("Content-Type", "application/json")
            .body(body.to_owned())
            .send()
            .map_err(|e| ProviderError::Transport(format!("Request failed: {}", e)))?;

        Self::read_response(response)
    }
}
