use std::sync::Arc;

use sqlx::Sqlite;
use sqlx::SqlitePool;
use sqlx::Transaction;

use crate::organizations::Organizations;
use crate::Result;

/// Process-wide storage handle. Built once at start-up and shared behind an
/// `Arc` by every request handler.
pub struct MetadataProvider {
    pool: SqlitePool,
    pub organizations: Arc<Organizations>,
}

impl MetadataProvider {
    pub fn new(pool: SqlitePool) -> Self {
        MetadataProvider {
            organizations: Arc::new(Organizations::new(pool.clone())),
            pool,
        }
    }

    /// Read transaction over one consistent snapshot. Not for writes: the
    /// lock upgrade fails with `SQLITE_BUSY` when another writer got there
    /// first.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Write transaction. Holds the database write lock from the first
    /// statement; concurrent writers wait up to the busy timeout.
    pub async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    pub async fn close(&self) {
        self.pool.close().await
    }
}
