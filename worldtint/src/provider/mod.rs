//! Imagery provider plumbing.
//!
//! Everything that talks HTTP lives here: the client abstraction, the
//! OAuth authenticator, and the Sentinel-2 rendering provider. The
//! orchestration layers depend only on the [`Authenticator`] and
//! [`RenderProvider`] traits, so tests replace the network with
//! scripted doubles.

mod auth;
mod http;
mod sentinel;
mod types;

pub use auth::{Authenticator, CdseAuthenticator};
pub use http::{HttpClient, ReqwestClient};
pub use sentinel::{ProcessRequest, RenderConfig, RenderProvider, SentinelProvider};
pub use types::{HttpResponse, ProviderError};

#[cfg(test)]
pub use http::tests::{MockHttpClient, RecordedRequest};
