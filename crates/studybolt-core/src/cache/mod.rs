//! Key-value stores with per-entry TTL, used to memoize search summaries.

pub mod memory;
pub mod redis_store;

pub use memory::MemoryCache;
pub use redis_store::RedisCache;

use crate::error::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Default lifetime of a cached summary.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Backend name (used in log lines and health output).
    fn name(&self) -> &str;

    /// Value stored under `key`, unless absent or past its TTL.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous entry.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<()>;
}

/// Deterministic key for a `(query, limit)` search summary.
///
/// Surrounding whitespace in the query does not change the key.
pub fn cache_key(query: &str, limit: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("search:{}:{}", query.trim(), limit).as_bytes());
    hex::encode(hasher.finalize())
}
