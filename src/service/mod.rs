//! Record Service
//!
//! Write-through caching over the record store. Every operation goes to
//! the store first; the cache is then updated or invalidated before the
//! call returns, and a notification is queued without waiting.
//!
//! # Cache keys
//! - `data:<id>` - one record, no expiry
//! - `all-data` - the full list, expires after the list TTL
//!
//! # Consistency
//! Mutations bump an epoch and then delete `all-data`. A list fill
//! remembers the epoch seen before its store read, writes, and re-checks:
//! if the epoch moved in between, it deletes its own write. Either the
//! fill sees the bump or the mutation's delete lands after the fill, so a
//! list made stale by a mutation never outlives that mutation.
//!
//! Record entries are last-writer-wins per key. `remove` leaves a short
//! tombstone for the id, and a record write that finds one undoes itself.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::{de::DeserializeOwned, Serialize};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::cache::{record_key, CacheStats, RecordCache, LIST_KEY};
use crate::error::{CacheError, Result, ServiceError, StoreError};
use crate::models::{NewRecord, Notification, Record};
use crate::notify::Notifier;
use crate::store::RecordStore;


/// Default lifetime of the cached list, in seconds
pub const DEFAULT_LIST_TTL: u64 = 60;

/// Default deadline for a single store or cache call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Tombstones outlive any record write in flight, which is bounded by
/// this many call deadlines
const TOMBSTONE_DEADLINES: u32 = 4;

const REQUIRED_FIELDS: &str = "Name and value are required";
const NOT_FOUND: &str = "Data not found";
const REGISTER_FAILED: &str = "Failed to register data";
const RETRIEVE_FAILED: &str = "Failed to retrieve data";
const REMOVE_FAILED: &str = "Failed to remove data";

// == Record Service ==
pub struct RecordService {
    store: Arc<dyn RecordStore>,
    cache: Arc<dyn RecordCache>,
    notifier: Notifier,
    list_ttl: u64,
    call_timeout: Duration,
    /// Number of mutations so far
    epoch: AtomicU64,
    /// Recently removed ids and when they were removed
    tombstones: Mutex<HashMap<String, Instant>>,
}

impl RecordService {
    pub fn new(store: Arc<dyn RecordStore>, cache: Arc<dyn RecordCache>, notifier: Notifier) -> Self {
        Self {
            store,
            cache,
            notifier,
            list_ttl: DEFAULT_LIST_TTL,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            epoch: AtomicU64::new(0),
            tombstones: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the lifetime of the cached list, in seconds.
    pub fn with_list_ttl(mut self, seconds: u64) -> Self {
        self.list_ttl = seconds;
        self
    }

    /// Sets the deadline applied to each store and cache call.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    // == Register ==
    /// Creates a record, caches it and invalidates the cached list.
    ///
    /// # Errors
    /// - `Validation` if `name` or `value` is empty; nothing is touched
    /// - `Store` if the store write fails; the cache is not touched
    pub async fn register(&self, name: impl Into<String>, value: impl Into<String>) -> Result<Record> {
        let new_record = NewRecord::new(name, value)
            .ok_or_else(|| ServiceError::Validation(REQUIRED_FIELDS.to_string()))?;

        let record = self
            .store_call(self.store.create(new_record))
            .await
            .map_err(ServiceError::store(REGISTER_FAILED))?;

        self.cache_record(&record).await;
        self.invalidate_list().await;

        self.notifier.notify(Notification::Register(record.clone()));
        info!(id = %record.id, "record registered");
        Ok(record)
    }

    // == List ==
    /// Returns every record, serving the cached list while it is fresh.
    ///
    /// A store read refills the cache and queues a `retrieve` notification.
    pub async fn list(&self) -> Result<Vec<Record>> {
        if let Some(records) = self.cache_get::<Vec<Record>>(LIST_KEY).await {
            debug!(count = records.len(), "list served from cache");
            return Ok(records);
        }

        let seen = self.current_epoch();
        let records = self
            .store_call(self.store.find_all())
            .await
            .map_err(ServiceError::store(RETRIEVE_FAILED))?;

        if self.current_epoch() == seen {
            self.cache_put(LIST_KEY, &records, Some(self.list_ttl)).await;
            if self.current_epoch() != seen {
                debug!("records changed while caching list, entry dropped");
                self.cache_delete(LIST_KEY).await;
            }
        } else {
            debug!("records changed during list read, not cached");
        }

        self.notifier.notify(Notification::Retrieve(records.clone()));
        debug!(count = records.len(), "list read from store");
        Ok(records)
    }

    // == Get ==
    /// Returns one record, reading through the single-record cache.
    pub async fn get(&self, id: &str) -> Result<Record> {
        if let Some(record) = self.cache_get::<Record>(&record_key(id)).await {
            return Ok(record);
        }

        let record = self
            .store_call(self.store.find_by_id(id))
            .await
            .map_err(ServiceError::store(RETRIEVE_FAILED))?
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))?;

        self.cache_record(&record).await;
        Ok(record)
    }

    // == Remove ==
    /// Deletes a record and drops it and the list from the cache.
    ///
    /// # Errors
    /// - `NotFound` if no record has this id; the cache is not touched
    /// - `Store` if the store delete fails; the cache is not touched
    pub async fn remove(&self, id: &str) -> Result<String> {
        let removed = self
            .store_call(self.store.delete_by_id(id))
            .await
            .map_err(ServiceError::store(REMOVE_FAILED))?;

        if removed.is_none() {
            return Err(ServiceError::NotFound(NOT_FOUND.to_string()));
        }

        self.add_tombstone(id);
        self.cache_delete(&record_key(id)).await;
        self.invalidate_list().await;

        self.notifier.notify(Notification::Remove(id.to_string()));
        info!(id, "record removed");
        Ok(id.to_string())
    }

    // == Stats ==
    /// Statistics of the underlying cache.
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Number of mutations applied, i.e. list invalidations performed.
    pub fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    // == Invalidation ==
    async fn invalidate_list(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.cache_delete(LIST_KEY).await;
    }

    /// Writes `data:<id>`, undoing the write if the id was removed meanwhile.
    async fn cache_record(&self, record: &Record) {
        let key = record_key(&record.id);
        self.cache_put(&key, record, None).await;
        if self.has_tombstone(&record.id) {
            debug!(id = %record.id, "record removed while caching, entry dropped");
            self.cache_delete(&key).await;
        }
    }

    fn add_tombstone(&self, id: &str) {
        let retention = self.call_timeout * TOMBSTONE_DEADLINES;
        let mut tombstones = self.tombstones.lock().unwrap_or_else(PoisonError::into_inner);
        tombstones.retain(|_, removed_at| removed_at.elapsed() < retention);
        tombstones.insert(id.to_string(), Instant::now());
    }

    fn has_tombstone(&self, id: &str) -> bool {
        self.tombstones
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    // == Collaborator Calls ==
    async fn store_call<T>(
        &self,
        call: impl Future<Output = std::result::Result<T, StoreError>>,
    ) -> std::result::Result<T, StoreError> {
        timeout(self.call_timeout, call)
            .await
            .map_err(|_| StoreError::Timeout(self.call_timeout))?
    }

    async fn cache_call<T>(
        &self,
        call: impl Future<Output = std::result::Result<T, CacheError>>,
    ) -> std::result::Result<T, CacheError> {
        timeout(self.call_timeout, call)
            .await
            .map_err(|_| CacheError::Timeout(self.call_timeout))?
    }

    /// Cached value under `key`; any cache failure reads as a miss.
    async fn cache_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.cache_call(self.cache.get(key)).await {
            Ok(bytes) => bytes?,
            Err(e) => {
                warn!(key, error = %e, "cache read failed, falling back to store");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "undecodable cache entry dropped");
                self.cache_delete(key).await;
                None
            }
        }
    }

    async fn cache_put<T: Serialize>(&self, key: &str, value: &T, ttl: Option<u64>) {
        let result = match serde_json::to_vec(value) {
            Ok(bytes) => self.cache_call(self.cache.set(key, bytes, ttl)).await,
            Err(e) => Err(CacheError::from(e)),
        };

        if let Err(e) = result {
            warn!(key, error = %e, "cache write failed");
        }
    }

    async fn cache_delete(&self, key: &str) {
        if let Err(e) = self.cache_call(self.cache.delete(key)).await {
            warn!(key, error = %e, "cache delete failed");
        }
    }
}
