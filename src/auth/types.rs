//! Typed service verdicts, tagged by the `result` field.

use serde::Deserialize;

/// Pre-authentication verdict for a user.
#[derive(Debug, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum PreauthResult {
    /// A second factor is required; `factors.default` may name an
    /// out-of-band factor the service can drive itself.
    Auth { factors: Option<Factors> },
    Allow { status: Option<String> },
    Deny { status: Option<String> },
    /// The user must self-enroll before authenticating.
    Enroll { status: Option<String> },
    #[serde(other)]
    Unknown,
}

/// Authentication verdict for a submitted factor or password.
#[derive(Debug, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum AuthResult {
    Allow { status: Option<String> },
    Deny { status: Option<String> },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Default, Deserialize)]
pub struct Factors {
    #[serde(default)]
    pub default: Option<String>,
}

/// Final decision for one connection attempt.
///
/// Only `Allow` permits the connection; `Enroll` and `Error` are distinct
/// flavors of denial kept apart for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
    Enroll,
    Error,
}

impl Decision {
    #[must_use]
    pub fn permitted(self) -> bool {
        matches!(self, Self::Allow)
    }
}
