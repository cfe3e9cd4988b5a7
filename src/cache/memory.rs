//! In-process cache adapter.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::{CacheStats, CacheStore, RecordCache};
use crate::error::CacheError;

/// `RecordCache` backed by a shared `CacheStore`.
///
/// Cloning is cheap; clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    inner: Arc<RwLock<CacheStore>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every expired entry, returning how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        self.inner.write().await.cleanup_expired()
    }

    /// Number of live and not-yet-purged entries.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl RecordCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        // Write lock: lookups update stats and may drop an expired entry
        Ok(self.inner.write().await.get(key))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<u64>) -> Result<(), CacheError> {
        self.inner.write().await.set(key.to_string(), value, ttl)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.inner.write().await.delete(key);
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }
}
