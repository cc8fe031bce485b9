//! Replay cache for recently approved connection attempts.
//!
//! A confirmed approval for an identity tuple (username, secret, source
//! address) is recorded under a digest key and suppresses the second-factor
//! challenge for subsequent identical attempts within the retention window.
//! The store is shared by many concurrent invocations without coordination:
//! every operation is individually idempotent, so races cost at worst a
//! redundant network call and never a false allow.

mod fs;
mod memory;

pub use fs::FsReplayCache;
pub use memory::MemoryReplayCache;

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use std::io;
use std::time::Duration;

/// Entries older than this are purged on every sweep.
pub const RETENTION: Duration = Duration::from_secs(12 * 60 * 60);

/// Digest identifying one approved identity tuple.
///
/// Derivation is a pure function: identical tuples always yield identical
/// keys. The key doubles as the marker file name, so it stays lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    #[must_use]
    pub fn derive(username: &str, secret: &SecretString, ipaddr: &str) -> Self {
        let mut sha = Sha512::new();
        for field in [username, secret.expose_secret(), ipaddr] {
            // Length-prefix each field so tuple boundaries stay unambiguous.
            sha.update((field.len() as u64).to_le_bytes());
            sha.update(field.as_bytes());
        }
        Self(hex::encode(sha.finalize()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Time-bounded store of approved identity digests.
///
/// Workflow logic only talks to this trait; the filesystem-backed
/// implementation and the in-memory test double live behind it.
pub trait ReplayCache {
    /// Sweep expired entries, then report whether `key` is present.
    ///
    /// # Errors
    /// Returns an error if the underlying store cannot be read.
    fn check(&self, key: &CacheKey) -> io::Result<bool>;

    /// Record an approval for `key` at the current time.
    ///
    /// # Errors
    /// Returns an error if the entry cannot be written.
    fn store(&self, key: &CacheKey) -> io::Result<()>;

    /// Delete entries older than the retention window.
    ///
    /// Deleting an already-deleted entry is not an error.
    ///
    /// # Errors
    /// Returns an error if the underlying store cannot be read or written.
    fn sweep(&self) -> io::Result<()>;
}
