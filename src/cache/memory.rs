//! In-memory replay cache used as a test double.

use crate::cache::{CacheKey, RETENTION, ReplayCache};
use std::collections::HashMap;
use std::io;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct MemoryReplayCache {
    retention: Duration,
    entries: Mutex<HashMap<CacheKey, Instant>>,
}

impl Default for MemoryReplayCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryReplayCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_retention(RETENTION)
    }

    #[must_use]
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            retention,
            entries: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReplayCache for MemoryReplayCache {
    fn check(&self, key: &CacheKey) -> io::Result<bool> {
        self.sweep()?;
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key))
    }

    fn store(&self, key: &CacheKey) -> io::Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), Instant::now());
        Ok(())
    }

    fn sweep(&self) -> io::Result<()> {
        let retention = self.retention;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, created| created.elapsed() <= retention);
        Ok(())
    }
}
