//! OAuth client-credentials authentication against the imagery provider.
//!
//! A single token call: client id and secret in, bearer token out. Any
//! failure here is fatal to the batch run; the processor aborts before
//! touching the first tile.

use serde::Deserialize;
use tracing::info;

use super::http::HttpClient;
use super::types::ProviderError;

/// Copernicus Data Space token endpoint.
const CDSE_TOKEN_URL: &str =
    "https://identity.dataspace.copernicus.eu/auth/realms/CDSE/protocol/openid-connect/token";

/// Trait for acquiring a bearer credential.
///
/// The processor depends on this seam so tests can substitute a static
/// token or a failing authenticator.
pub trait Authenticator: Send + Sync {
    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::AuthenticationFailed`] when the identity
    /// provider rejects the exchange, [`ProviderError::Transport`] when
    /// the call never completes, and
    /// [`ProviderError::MalformedResponse`] when the token body cannot
    /// be parsed.
    fn access_token(&self) -> Result<String, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Authenticator for the Copernicus Data Space identity provider.
pub struct CdseAuthenticator<C: HttpClient> {
    http_client: C,
    client_id: String,
    client_secret: String,
    token_url: String,
}

impl<C: HttpClient> CdseAuthenticator<C> {
    /// Creates an authenticator against the production token endpoint.
    pub fn new(
        http_client: C,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: CDSE_TOKEN_URL.to_string(),
        }
    }

    /// Override the token endpoint.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }
}

impl<C: HttpClient> Authenticator for CdseAuthenticator<C> {
    fn access_token(&self) -> Result<String, ProviderError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self.http_client.post_form(&self.token_url, &form)?;
        if !response.is_success() {
            return Err(ProviderError::AuthenticationFailed(format!(
                "HTTP {}: {}",
                response.status,
                response.body_text()
            )));
        }

        let token: TokenResponse = serde_json::from_slice(&response.body).map_err(|e| {
            ProviderError::MalformedResponse(format!("token response: {}", e))
        })?;

        info!("authentication successful");
        Ok(token.access_token)
    }
}
