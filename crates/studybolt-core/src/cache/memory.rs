use super::CacheStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct CachedValue {
    value: String,
    expires_at: Instant,
}

/// Once the map holds this many entries, a write first drops every expired one.
pub const DEFAULT_SWEEP_THRESHOLD: usize = 1024;

/// In-process cache with per-entry TTL. Expired entries are never returned;
/// they are dropped when looked up, or swept on write once the map grows
/// past the sweep threshold.
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CachedValue>>,
    sweep_threshold: usize,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::with_sweep_threshold(DEFAULT_SWEEP_THRESHOLD)
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sweep_threshold(sweep_threshold: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            sweep_threshold,
        }
    }

    /// Number of entries held, including ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        if entries.len() >= self.sweep_threshold {
            entries.retain(|_, entry| entry.expires_at > now);
        }
        entries.insert(
            key.to_string(),
            CachedValue {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
