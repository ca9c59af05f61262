//! Repository for inventory rows and sync bookkeeping.

use crate::error::{ErrorKind, Result};
use crate::models::{FileRow, InventoryFile, InventoryStats};
use crate::Database;
use exn::ResultExt;
use glimpse_remote::{FileKind, RemoteFileRecord};
use sqlx::SqlitePool;
use time::UtcDateTime;

const META_LAST_SYNC: &str = "last_sync";
const META_LAST_FULL_SYNC: &str = "last_full_sync";

/// Repository for the mirrored file listing.
///
/// Rows are keyed by normalized path. Re-applying the same upsert is
/// idempotent, which is what makes sync page re-application after a crash
/// safe.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert a batch of records in one transaction and stamp the sync
    /// timestamps. Returns the number of rows written.
    ///
    /// All rows land or none do; a page of sync results is either fully
    /// committed or fully retried.
    pub async fn upsert_many(&self, records: &[RemoteFileRecord], full_sync: bool) -> Result<u64> {
        let now = UtcDateTime::now();
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for record in records {
            let row = FileRow::from_record(record, now)?;
            row.bind_to(sqlx::query(include_str!("../queries/upsert_file.sql")))
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        Self::set_meta(&mut tx, META_LAST_SYNC, &now.unix_timestamp().to_string()).await?;
        if full_sync {
            Self::set_meta(&mut tx, META_LAST_FULL_SYNC, &now.unix_timestamp().to_string()).await?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(records.len() as u64)
    }

    /// Delete the row for a normalized path. Deleting an absent path is not
    /// an error; returns whether a row was removed.
    pub async fn remove(&self, normalized_path: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE normalized_path = ?")
            .bind(normalized_path)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// List inventory rows, optionally restricted to a folder prefix and a
    /// set of kinds, ordered by display path.
    pub async fn list(&self, prefix: Option<&str>, kinds: Option<&[FileKind]>) -> Result<Vec<InventoryFile>> {
        let prefix = prefix
            .map(glimpse_remote::normalize_path)
            .transpose()
            .map_err(|_| exn::Exn::from(ErrorKind::InvalidData("prefix")))?;
        let rows: Vec<FileRow> = sqlx::query_as(include_str!("../queries/list_files.sql"))
            .bind(prefix)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let files = rows.into_iter().map(InventoryFile::try_from).collect::<Result<Vec<_>>>()?;
        Ok(match kinds {
            Some(kinds) => files.into_iter().filter(|f| kinds.contains(&f.record.kind)).collect(),
            None => files,
        })
    }

    /// Rows whose remote modification time is strictly after `since`, most
    /// recently modified first.
    pub async fn list_modified_after(&self, since: UtcDateTime) -> Result<Vec<InventoryFile>> {
        let rows: Vec<FileRow> = sqlx::query_as(include_str!("../queries/list_modified_after.sql"))
            .bind(since.unix_timestamp())
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(InventoryFile::try_from).collect()
    }

    /// Look up a single row by path. Accepts any casing; the case-folded
    /// form is the key.
    pub async fn find_by_path(&self, path: &str) -> Result<Option<InventoryFile>> {
        let normalized = glimpse_remote::normalize_path(path)
            .map_err(|_| exn::Exn::from(ErrorKind::InvalidData("path")))?;
        let row: Option<FileRow> = sqlx::query_as(include_str!("../queries/get_by_normalized_path.sql"))
            .bind(normalized)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(InventoryFile::try_from).transpose()
    }

    /// Whether the inventory holds no file rows at all. Drives the full
    /// resync decision.
    pub async fn is_empty(&self) -> Result<bool> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM files")
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(row.0 == 0)
    }

    /// Aggregate counters for status output.
    pub async fn stats(&self) -> Result<InventoryStats> {
        let (total, images, videos): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE kind = 'image'),
                COUNT(*) FILTER (WHERE kind = 'video')
            FROM files
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .or_raise(|| ErrorKind::Database)?;
        let (size,): (i64,) =
            sqlx::query_as("SELECT page_count * page_size FROM pragma_page_count(), pragma_page_size()")
                .fetch_one(&self.pool)
                .await
                .or_raise(|| ErrorKind::Database)?;
        Ok(InventoryStats {
            total_files: total as u64,
            images: images as u64,
            videos: videos as u64,
            last_sync: self.get_meta_timestamp(META_LAST_SYNC).await?,
            last_full_sync: self.get_meta_timestamp(META_LAST_FULL_SYNC).await?,
            database_size_bytes: size.max(0) as u64,
        })
    }

    /// Wipe all file rows and sync bookkeeping, cursor included. The next
    /// sync pass will be a full resync.
    pub async fn clear(&self) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query("DELETE FROM files").execute(&mut *tx).await.or_raise(|| ErrorKind::Database)?;
        sqlx::query("DELETE FROM metadata").execute(&mut *tx).await.or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        tracing::info!("inventory cleared");
        Ok(())
    }

    async fn set_meta(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        key: &str,
        value: &str,
    ) -> Result<()> {
        sqlx::query("INSERT INTO metadata (key, value) VALUES (?, ?) ON CONFLICT (key) DO UPDATE SET value = excluded.value")
            .bind(key)
            .bind(value)
            .execute(&mut **tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn get_meta_timestamp(&self, key: &str) -> Result<Option<UtcDateTime>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM metadata WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        value
            .map(|v| {
                let seconds = v.parse::<i64>().map_err(|_| exn::Exn::from(ErrorKind::InvalidData("timestamp")))?;
                UtcDateTime::from_unix_timestamp(seconds).or_raise(|| ErrorKind::InvalidData("timestamp"))
            })
            .transpose()
    }
}
