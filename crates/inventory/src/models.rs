use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use glimpse_remote::{FileKind, RemoteFileRecord};
use serde::{Deserialize, Serialize};
use time::UtcDateTime;

/// One inventory row: the mirrored remote record plus local bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryFile {
    pub record: RemoteFileRecord,
    /// When a sync pass last wrote this row.
    pub last_synced: UtcDateTime,
}

/// The persisted continuation token of the last successful sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCursor {
    pub token: String,
    pub issued_at: UtcDateTime,
    /// Whether the pass that produced this cursor was a full listing.
    pub is_full_sync: bool,
}

impl SyncCursor {
    pub fn new(token: impl Into<String>, is_full_sync: bool) -> Self {
        Self { token: token.into(), issued_at: UtcDateTime::now(), is_full_sync }
    }
}

/// Aggregate inventory counters for the `stats` CLI command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventoryStats {
    pub total_files: u64,
    pub images: u64,
    pub videos: u64,
    pub last_sync: Option<UtcDateTime>,
    pub last_full_sync: Option<UtcDateTime>,
    pub database_size_bytes: u64,
}

#[derive(sqlx::FromRow)]
pub(crate) struct FileRow {
    normalized_path: String,
    remote_id: String,
    path: String,
    name: String,
    parent_path: Option<String>,
    kind: String,
    extension: String,
    size_bytes: i64,
    modified_at: i64,
    content_fingerprint: Option<String>,
    last_synced: i64,
}

impl FileRow {
    pub(crate) fn from_record(record: &RemoteFileRecord, last_synced: UtcDateTime) -> Result<Self, Error> {
        Ok(Self {
            normalized_path: record.normalized_path.clone(),
            remote_id: record.id.clone(),
            path: record.path.clone(),
            name: record.name.clone(),
            parent_path: record.parent().map(str::to_string),
            kind: record.kind.to_string(),
            extension: record.extension.clone(),
            size_bytes: i64::try_from(record.size_bytes).or_raise(|| ErrorKind::InvalidData("file size"))?,
            modified_at: record.modified_at.unix_timestamp(),
            content_fingerprint: record.content_fingerprint.clone(),
            last_synced: last_synced.unix_timestamp(),
        })
    }

    pub(crate) fn bind_to<'q>(
        self,
        query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        query
            .bind(self.normalized_path)
            .bind(self.remote_id)
            .bind(self.path)
            .bind(self.name)
            .bind(self.parent_path)
            .bind(self.kind)
            .bind(self.extension)
            .bind(self.size_bytes)
            .bind(self.modified_at)
            .bind(self.content_fingerprint)
            .bind(self.last_synced)
    }
}

impl TryFrom<FileRow> for InventoryFile {
    type Error = Error;
    fn try_from(row: FileRow) -> Result<Self, Self::Error> {
        let kind = row.kind.parse::<FileKind>().map_err(|_| exn::Exn::from(ErrorKind::InvalidData("kind")))?;
        let record = RemoteFileRecord {
            id: row.remote_id,
            name: row.name,
            path: row.path,
            normalized_path: row.normalized_path,
            size_bytes: u64::try_from(row.size_bytes).or_raise(|| ErrorKind::InvalidData("file size"))?,
            modified_at: UtcDateTime::from_unix_timestamp(row.modified_at)
                .or_raise(|| ErrorKind::InvalidData("modification date"))?,
            content_fingerprint: row.content_fingerprint,
            kind,
            extension: row.extension,
        };
        Ok(Self {
            record,
            last_synced: UtcDateTime::from_unix_timestamp(row.last_synced)
                .or_raise(|| ErrorKind::InvalidData("sync date"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> RemoteFileRecord {
        RemoteFileRecord::from_listing("id:1", "Photos/Summer/Beach.JPG", 2048, UtcDateTime::now(), Some("fp".to_string()))
            .unwrap()
            .expect("jpg is supported")
    }

    #[test]
    fn test_row_round_trips_record() {
        let record = sample_record();
        let synced = UtcDateTime::now();
        let row = FileRow::from_record(&record, synced).unwrap();
        assert_eq!(row.parent_path.as_deref(), Some("Photos/Summer"));
        let file = InventoryFile::try_from(row).unwrap();
        // Unix timestamps are whole seconds, so sub-second precision is lost.
        assert_eq!(file.record.modified_at, record.modified_at.replace_nanosecond(0).unwrap());
        assert_eq!(file.record.normalized_path, record.normalized_path);
        assert_eq!(file.record.kind, record.kind);
    }
}
