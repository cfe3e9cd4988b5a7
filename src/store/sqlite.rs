//! SQLite record store.

use std::path::Path;

use anyhow::{Context, Result as AnyResult};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NewRecord, Record};
use crate::store::RecordStore;

type RecordRow = (String, String, String);

fn into_record((id, name, value): RecordRow) -> Record {
    Record { id, name, value }
}

/// Store backed by an embedded SQLite database.
///
/// Records list in insertion order via an autoincrement sequence column.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database file at `database_path`.
    pub async fn connect(database_path: &str) -> AnyResult<Self> {
        info!("Opening SQLite database at: {}", database_path);

        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to SQLite database at: {}", database_path))?;

        Self::with_pool(pool).await
    }

    /// Opens a private in-memory database.
    pub async fn in_memory() -> AnyResult<Self> {
        // One connection that never recycles, or the database would vanish
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::new().filename(":memory:"))
            .await
            .context("Failed to open in-memory SQLite database")?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> AnyResult<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("Failed to create records table")?;

        info!("Record store ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn create(&self, record: NewRecord) -> Result<Record, StoreError> {
        let record = record.with_id(Uuid::now_v7().to_string());

        sqlx::query("INSERT INTO records (id, name, value) VALUES (?1, ?2, ?3)")
            .bind(&record.id)
            .bind(&record.name)
            .bind(&record.value)
            .execute(&self.pool)
            .await?;

        debug!(id = %record.id, "record stored");
        Ok(record)
    }

    async fn find_all(&self) -> Result<Vec<Record>, StoreError> {
        let rows = sqlx::query_as::<_, RecordRow>("SELECT id, name, value FROM records ORDER BY seq")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(into_record).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let row = sqlx::query_as::<_, RecordRow>("SELECT id, name, value FROM records WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(into_record))
    }

    async fn delete_by_id(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let row = sqlx::query_as::<_, RecordRow>(
            "DELETE FROM records WHERE id = ?1 RETURNING id, name, value",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if row.is_some() {
            debug!(id, "record deleted");
        }
        Ok(row.map(into_record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_record(name: &str, value: &str) -> NewRecord {
        NewRecord::new(name, value).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = SqliteStore::in_memory().await.unwrap();

        let record = store.create(new_record("a", "1")).await.unwrap();

        assert!(!record.id.is_empty());
        assert_eq!(store.find_by_id(&record.id).await.unwrap(), Some(record));
        assert_eq!(store.find_by_id("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_find_all_keeps_creation_order() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut ids = Vec::new();
        for i in 0..10 {
            ids.push(store.create(new_record("n", &i.to_string())).await.unwrap().id);
        }

        let listed: Vec<String> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_delete_by_id_returns_removed_record() {
        let store = SqliteStore::in_memory().await.unwrap();
        let record = store.create(new_record("a", "1")).await.unwrap();

        assert_eq!(store.delete_by_id(&record.id).await.unwrap(), Some(record.clone()));
        assert_eq!(store.delete_by_id(&record.id).await.unwrap(), None);
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_records_survive_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("records.db");
        let path = path.to_str().unwrap();

        let record = {
            let store = SqliteStore::connect(path).await.unwrap();
            let record = store.create(new_record("a", "1")).await.unwrap();
            store.pool.close().await;
            record
        };

        let store = SqliteStore::connect(path).await.unwrap();
        assert_eq!(store.find_all().await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_closed_pool_reports_database_error() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.pool.close().await;

        assert!(matches!(store.find_all().await, Err(StoreError::Database(_))));
    }
}
