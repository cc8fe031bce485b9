//! Signed client for the authentication service REST API.
//!
//! This module keeps API connectivity logic in one place so the workflow can
//! share request signing, timeouts, and error handling. Every call is
//! authenticated with an HMAC-SHA1 signature over a canonical request string
//! and performed as a single request/response exchange with no pooling and
//! no retries.

mod error;
pub mod response;
pub mod sign;
mod transport;

pub use error::Error;
pub use sign::SignatureVersion;
pub use transport::{ApiClient, ApiResponse, ClientSettings, ProxyConfig, TlsMode};

/// Request parameters: ordered (name, value) string pairs.
///
/// Repeated names are allowed and contribute one pair per value. Insertion
/// order does not affect the request signature; canonicalization sorts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: &str) {
        self.0.push((key.to_string(), value.to_string()));
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.push(key, value);
        self
    }

    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
