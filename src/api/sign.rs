//! Request canonicalization and signing.
//!
//! The service authenticates callers with an HMAC-SHA1 signature over a
//! deterministic representation of the request. Parameters are normalized
//! the same way as OAuth 1.0 request signing (RFC 5849 §3.4.1.3.2), so the
//! signature is independent of parameter insertion order.

use crate::api::{Error, Params};
use base64::{Engine, engine::general_purpose};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

// Escape everything except unreserved characters and '~'.
const SIGNATURE_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Canonical-string layout, fixed at client construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureVersion {
    #[default]
    V1,
    /// Same as `V1` with the request date prepended as the first line.
    V2,
}

impl SignatureVersion {
    /// Map the configured numeric version to a known layout.
    ///
    /// # Errors
    /// Returns `Error::Config` for any version other than 1 or 2.
    pub fn from_config(version: u8) -> Result<Self, Error> {
        match version {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            other => Err(Error::Config(format!(
                "unsupported signature version {other}"
            ))),
        }
    }
}

fn quote(value: &str) -> String {
    utf8_percent_encode(value, SIGNATURE_ESCAPE).to_string()
}

/// Canonical parameter string: percent-encoded `key=value` pairs sorted by
/// key then value, joined with `&`.
#[must_use]
pub fn canon_params(params: &Params) -> String {
    let mut encoded: Vec<(String, String)> = params
        .pairs()
        .iter()
        .map(|(key, value)| (quote(key), quote(value)))
        .collect();
    encoded.sort();

    let args: Vec<String> = encoded
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    args.join("&")
}

/// Canonical request string: newline-joined method, lowercased host, uri,
/// and canonical parameters, with the date prepended for version 2.
#[must_use]
pub fn canonicalize(
    method: &str,
    host: &str,
    uri: &str,
    params: &Params,
    date: &str,
    version: SignatureVersion,
) -> String {
    let mut canon = match version {
        SignatureVersion::V1 => Vec::with_capacity(4),
        SignatureVersion::V2 => vec![date.to_string()],
    };

    canon.push(method.to_uppercase());
    canon.push(host.to_lowercase());
    canon.push(uri.to_string());
    canon.push(canon_params(params));
    canon.join("\n")
}

/// Build the `Authorization` header value for a request.
///
/// The value is `Basic base64(ikey:hexdigest)` where the digest is the
/// HMAC-SHA1 of the canonical request string keyed by the secret key.
///
/// # Errors
/// Returns `Error::Config` if the HMAC cannot be keyed.
#[allow(clippy::too_many_arguments)]
pub fn sign(
    ikey: &str,
    skey: &SecretString,
    method: &str,
    host: &str,
    uri: &str,
    date: &str,
    version: SignatureVersion,
    params: &Params,
) -> Result<String, Error> {
    let canonical = canonicalize(method, host, uri, params, date, version);

    let mut mac = HmacSha1::new_from_slice(skey.expose_secret().as_bytes())
        .map_err(|_| Error::Config("invalid secret key".to_string()))?;
    mac.update(canonical.as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());

    let auth = format!("{ikey}:{digest}");
    Ok(format!("Basic {}", general_purpose::STANDARD.encode(auth)))
}
