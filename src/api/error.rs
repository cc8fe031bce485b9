use bytes::Bytes;
use thiserror::Error;

/// Failures raised below the authentication workflow boundary.
///
/// `Config` is fatal before any network call is attempted; `Transport` and
/// `Protocol` propagate up to the workflow, which converts them into a
/// denial.
#[derive(Debug, Error)]
pub enum Error {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("received {status} {message}")]
    Protocol {
        status: u16,
        reason: String,
        message: String,
        body: Bytes,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    #[must_use]
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }
}
