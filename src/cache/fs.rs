//! Filesystem-backed replay cache.
//!
//! Approvals are zero-byte marker files named by the identity digest inside
//! a shared cache directory; the marker's modification time is the only
//! metadata. Concurrent invocations may create, check, and delete markers
//! without coordination.

use crate::cache::{CacheKey, RETENTION, ReplayCache};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FsReplayCache {
    dir: PathBuf,
    retention: Duration,
}

impl FsReplayCache {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_retention(dir, RETENTION)
    }

    #[must_use]
    pub fn with_retention(dir: impl Into<PathBuf>, retention: Duration) -> Self {
        Self {
            dir: dir.into(),
            retention,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ReplayCache for FsReplayCache {
    fn check(&self, key: &CacheKey) -> io::Result<bool> {
        self.sweep()?;
        Ok(self.dir.join(key.as_str()).is_file())
    }

    fn store(&self, key: &CacheKey) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        // Creating the marker is idempotent; re-creating refreshes its mtime.
        fs::File::create(self.dir.join(key.as_str()))?;
        debug!("recorded replay cache entry in {}", self.dir.display());
        Ok(())
    }

    fn sweep(&self) -> io::Result<()> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            // No cache directory yet: nothing to sweep.
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err),
        };

        let now = SystemTime::now();
        for entry in entries {
            let entry = entry?;
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                // Another invocation swept this entry first.
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err),
            };
            let expired = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .is_some_and(|age| age > self.retention);
            if expired {
                match fs::remove_file(entry.path()) {
                    Ok(()) => debug!("purged expired cache entry {:?}", entry.file_name()),
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(())
    }
}
