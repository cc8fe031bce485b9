//! # Vigilo (VPN Second-Factor Gate)
//!
//! `vigilo` is a second-factor authentication client invoked by a VPN gateway
//! once per connection attempt. It asks a remote authentication service
//! whether the connecting user may proceed and reports the verdict back to
//! the gateway through a control file (`1` = allow, `0` = deny).
//!
//! Every API call is authenticated with an HMAC-SHA1 signature over a
//! canonical request string (OAuth-style parameter normalization), carried in
//! a `Basic` authorization header together with the matching RFC-2822 `Date`
//! header.
//!
//! ## Decision flow
//!
//! 1. **Replay cache**: recently approved `(user, secret, address)` tuples
//!    are recorded as digest-named markers in a shared cache directory.
//!    A fresh marker short-circuits the attempt to *allow* with no network
//!    traffic; entries expire after 12 hours.
//! 2. **Pre-authentication**: the service classifies the user as approved
//!    outright, denied, not enrolled, or challenged for a second factor
//!    (optionally naming a default out-of-band factor such as `push`).
//! 3. **Authentication**: the supplied password (or the default factor) is
//!    submitted for verification; an `allow` result is recorded in the
//!    replay cache.
//!
//! The workflow is fail-closed: transport failures, malformed responses, and
//! unknown result codes all resolve to a denial, never an allowance.

pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
