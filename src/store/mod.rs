//! Store Module
//!
//! The authoritative record store collaborator, its SQLite adapter and an
//! in-process adapter used by tests.

mod memory;
mod sqlite;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{NewRecord, Record};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

// == Record Store ==
/// Persistent store of records. The store owns identifier assignment.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persists a record and returns it with its new identifier.
    async fn create(&self, record: NewRecord) -> Result<Record, StoreError>;

    /// Returns every record in creation order.
    async fn find_all(&self) -> Result<Vec<Record>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Record>, StoreError>;

    /// Deletes a record, returning it if it existed.
    async fn delete_by_id(&self, id: &str) -> Result<Option<Record>, StoreError>;
}
