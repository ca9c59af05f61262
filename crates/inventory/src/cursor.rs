//! Persistence for the sync continuation cursor.
//!
//! The cursor lives in the metadata table, deliberately independent of file
//! rows: a sync pass commits its page of upserts first and persists the
//! cursor after, so a crash between the two re-applies an already committed
//! page (harmless, upserts are idempotent) instead of skipping one.

use crate::error::{ErrorKind, Result};
use crate::models::SyncCursor;
use crate::Database;
use exn::ResultExt;
use sqlx::SqlitePool;

const META_CURSOR: &str = "sync_cursor";

#[derive(Debug, Clone)]
pub struct CursorStore {
    pool: SqlitePool,
}

impl From<&Database> for CursorStore {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}

impl CursorStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The cursor of the last committed sync pass, if any.
    pub async fn load(&self) -> Result<Option<SyncCursor>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM metadata WHERE key = ?")
            .bind(META_CURSOR)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        value
            .map(|v| serde_json::from_str(&v).or_raise(|| ErrorKind::InvalidData("cursor")))
            .transpose()
    }

    /// Persist the cursor, replacing any previous one.
    pub async fn save(&self, cursor: &SyncCursor) -> Result<()> {
        let value = serde_json::to_string(cursor).or_raise(|| ErrorKind::InvalidData("cursor"))?;
        sqlx::query("INSERT INTO metadata (key, value) VALUES (?, ?) ON CONFLICT (key) DO UPDATE SET value = excluded.value")
            .bind(META_CURSOR)
            .bind(value)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Drop the persisted cursor. The next sync pass starts from scratch.
    pub async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM metadata WHERE key = ?")
            .bind(META_CURSOR)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_save_replace() {
        let db = Database::connect_in_memory().await.unwrap();
        let store = CursorStore::from(&db);
        assert!(store.load().await.unwrap().is_none());

        let first = SyncCursor::new("delta:0:", true);
        store.save(&first).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.token, "delta:0:");
        assert!(loaded.is_full_sync);

        let second = SyncCursor::new("delta:7:", false);
        store.save(&second).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.token, "delta:7:");
        assert!(!loaded.is_full_sync);

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
