//! In-process record store.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NewRecord, Record};
use crate::store::RecordStore;

#[derive(Debug, Default)]
struct Tables {
    /// Records keyed by insertion sequence, which fixes listing order
    records: BTreeMap<u64, Record>,
    /// Identifier to insertion sequence
    index: HashMap<String, u64>,
    next_seq: u64,
}

/// Store that keeps records in memory and assigns UUIDv7 identifiers.
///
/// Call counters and an offline switch make it usable as a test double.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    offline: AtomicBool,
    creates: AtomicUsize,
    reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with `StoreError::Backend`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of `create` calls received.
    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Number of `find_all` and `find_by_id` calls received.
    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("store is unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create(&self, record: NewRecord) -> Result<Record, StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;

        let record = record.with_id(Uuid::now_v7().to_string());
        let mut tables = self.tables.write().await;
        let seq = tables.next_seq;
        tables.next_seq += 1;
        tables.index.insert(record.id.clone(), seq);
        tables.records.insert(seq, record.clone());

        debug!(id = %record.id, "record stored");
        Ok(record)
    }

    async fn find_all(&self) -> Result<Vec<Record>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;

        Ok(self.tables.read().await.records.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Record>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;

        let tables = self.tables.read().await;
        Ok(tables
            .index
            .get(id)
            .and_then(|seq| tables.records.get(seq))
            .cloned())
    }

    async fn delete_by_id(&self, id: &str) -> Result<Option<Record>, StoreError> {
        self.check_online()?;

        let mut tables = self.tables.write().await;
        let removed = match tables.index.remove(id) {
            Some(seq) => tables.records.remove(&seq),
            None => None,
        };

        if removed.is_some() {
            debug!(id, "record deleted");
        }
        Ok(removed)
    }
}
