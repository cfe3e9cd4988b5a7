//! Cache Module
//!
//! The cache collaborator of the registry: a byte-oriented key/value
//! interface with optional per-entry TTL, plus an in-process engine.

mod entry;
mod memory;
mod stats;
mod store;

use async_trait::async_trait;

use crate::error::CacheError;

// Re-export public types
pub use entry::CacheEntry;
pub use memory::MemoryCache;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 16 * 1024 * 1024; // 16 MB

/// Key of the cached full record list
pub const LIST_KEY: &str = "all-data";

/// Key of the single-record entry for `id`.
pub fn record_key(id: &str) -> String {
    format!("data:{}", id)
}

// == Record Cache ==
/// Cache backend used by the registry.
///
/// Values are opaque bytes; `ttl` is in seconds and `None` means the entry
/// lives until deleted.
#[async_trait]
pub trait RecordCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<u64>) -> Result<(), CacheError>;

    /// Removes `key`; deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Engine statistics, when the backend keeps any.
    async fn stats(&self) -> CacheStats {
        CacheStats::default()
    }
}
