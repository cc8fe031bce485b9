//! Two-phase authentication workflow.
//!
//! One connection attempt runs pre-authentication, then (when a second
//! factor is required) authentication, and resolves to a [`Decision`]. The
//! workflow is the single fail-closed boundary: transport failures,
//! protocol errors, and unexpected service verdicts are all caught in
//! [`Workflow::run`] and resolved to a non-allow decision, so no lower-layer
//! error escapes it.

mod types;

pub use types::{AuthResult, Decision, Factors, PreauthResult};

use crate::api::{ApiClient, Error as ApiError, Params};
use crate::cache::{CacheKey, ReplayCache};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const PREAUTH_PATH: &str = "/rest/v1/preauth";
pub const AUTH_PATH: &str = "/rest/v1/auth";

/// Per-attempt identity supplied by the gateway.
#[derive(Debug, Clone)]
pub struct Identity {
    pub username: String,
    pub password: Option<SecretString>,
    pub ipaddr: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),
    /// A well-formed envelope whose verdict is missing or unknown.
    #[error("unexpected service response: {0}")]
    UnexpectedResponse(String),
}

pub struct Workflow<'a, C> {
    client: &'a ApiClient,
    cache: &'a C,
}

impl<'a, C: ReplayCache> Workflow<'a, C> {
    #[must_use]
    pub fn new(client: &'a ApiClient, cache: &'a C) -> Self {
        Self { client, cache }
    }

    /// Resolve one connection attempt to a decision.
    ///
    /// Never returns an error: any failure below this boundary is logged
    /// and resolved to `Decision::Error`, which denies the attempt.
    pub async fn run(&self, identity: &Identity) -> Decision {
        match self.attempt(identity).await {
            Ok(decision) => decision,
            Err(err) => {
                error!("authentication attempt for {} failed: {err}", identity.username);
                Decision::Error
            }
        }
    }

    async fn attempt(&self, identity: &Identity) -> Result<Decision, AuthError> {
        // With a caller-supplied secret the cache key is derivable up front;
        // a fresh approval skips the network entirely.
        let supplied_key = identity
            .password
            .as_ref()
            .map(|password| CacheKey::derive(&identity.username, password, &identity.ipaddr));
        if let Some(key) = &supplied_key {
            if self.cache_hit(key) {
                info!("using cached authentication for {}", identity.username);
                return Ok(Decision::Allow);
            }
        }

        let default_factor = match self.preauth(&identity.username).await? {
            PreauthResult::Auth { factors } => factors.unwrap_or_default().default,
            PreauthResult::Allow { status } => {
                let status = require_status("preauth", "allow", status)?;
                info!("preauth success for {}: {status}", identity.username);
                return Ok(Decision::Allow);
            }
            PreauthResult::Deny { status } => {
                let status = require_status("preauth", "deny", status)?;
                warn!("preauth failure for {}: {status}", identity.username);
                return Ok(Decision::Deny);
            }
            PreauthResult::Enroll { status } => {
                let status = require_status("preauth", "enroll", status)?;
                warn!("user {} is not enrolled: {status}", identity.username);
                return Ok(Decision::Enroll);
            }
            PreauthResult::Unknown => {
                return Err(AuthError::UnexpectedResponse(
                    "unknown preauth result".to_string(),
                ));
            }
        };

        // An explicit password wins; otherwise fall back to the default
        // out-of-band factor named by preauth.
        let secret = match (&identity.password, default_factor) {
            (Some(password), _) => password.clone(),
            (None, Some(factor)) => SecretString::from(factor),
            (None, None) => {
                warn!(
                    "no password provided and no out-of-band factors available for {}",
                    identity.username
                );
                return Ok(Decision::Deny);
            }
        };

        let key = CacheKey::derive(&identity.username, &secret, &identity.ipaddr);
        // With an out-of-band factor the key only became derivable now.
        if supplied_key.is_none() && self.cache_hit(&key) {
            info!("using cached authentication for {}", identity.username);
            return Ok(Decision::Allow);
        }

        match self.auth(identity, &secret).await? {
            AuthResult::Allow { status } => {
                let status = require_status("auth", "allow", status)?;
                info!("auth success for {}: {status}", identity.username);
                if let Err(err) = self.cache.store(&key) {
                    // The approval is already network-confirmed; a cache
                    // write failure only costs a future redundant call.
                    warn!("failed to record replay cache entry: {err}");
                }
                Ok(Decision::Allow)
            }
            AuthResult::Deny { status } => {
                let status = require_status("auth", "deny", status)?;
                warn!("auth failure for {}: {status}", identity.username);
                Ok(Decision::Deny)
            }
            AuthResult::Unknown => Err(AuthError::UnexpectedResponse(
                "unknown auth result".to_string(),
            )),
        }
    }

    async fn preauth(&self, username: &str) -> Result<PreauthResult, AuthError> {
        debug!("pre-authentication for {username}");
        let params = Params::new().with("user", username);
        let payload = self
            .client
            .json_api_call(Method::POST, PREAUTH_PATH, &params)
            .await?;
        serde_json::from_value(payload)
            .map_err(|e| AuthError::UnexpectedResponse(format!("malformed preauth response: {e}")))
    }

    async fn auth(
        &self,
        identity: &Identity,
        secret: &SecretString,
    ) -> Result<AuthResult, AuthError> {
        debug!("authentication for {}", identity.username);
        let params = Params::new()
            .with("user", &identity.username)
            .with("factor", "auto")
            .with("auto", secret.expose_secret())
            .with("ipaddr", &identity.ipaddr);
        let payload = self
            .client
            .json_api_call(Method::POST, AUTH_PATH, &params)
            .await?;
        serde_json::from_value(payload)
            .map_err(|e| AuthError::UnexpectedResponse(format!("malformed auth response: {e}")))
    }

    fn cache_hit(&self, key: &CacheKey) -> bool {
        match self.cache.check(key) {
            Ok(hit) => hit,
            Err(err) => {
                // An unreadable cache degrades to a network round-trip.
                warn!("replay cache check failed: {err}");
                false
            }
        }
    }
}

fn require_status(
    endpoint: &str,
    result: &str,
    status: Option<String>,
) -> Result<String, AuthError> {
    status.ok_or_else(|| {
        AuthError::UnexpectedResponse(format!("{endpoint} result {result:?} without status"))
    })
}
