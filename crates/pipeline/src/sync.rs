//! Delta synchronization between the remote listing and the local inventory.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use glimpse_inventory::{CursorStore, Repository, SyncCursor};
use glimpse_remote::{FileKind, ListEntry, ListPage, RemoteFileRecord, RemoteHandle};
use tracing::{debug, info, instrument, warn};

/// Extension sets the engine classifies against. Configured, not the
/// built-in defaults: a deployment may narrow or widen what counts as media.
#[derive(Debug, Clone)]
pub struct MediaFilter {
    pub image_extensions: Vec<String>,
    pub video_extensions: Vec<String>,
}

impl MediaFilter {
    /// Re-classify a listed record against the configured sets. `None`
    /// means the file is not media under this configuration and never
    /// enters the inventory.
    fn classify(&self, mut record: RemoteFileRecord) -> Option<RemoteFileRecord> {
        let kind =
            FileKind::from_extension(&record.extension, &self.image_extensions, &self.video_extensions)?;
        record.kind = kind;
        Some(record)
    }
}

/// Result of one sync pass.
#[derive(Debug)]
pub struct SyncOutcome {
    /// Records upserted by this pass only. Feeds "process what changed".
    pub changed: Vec<RemoteFileRecord>,
    /// Inventory rows deleted by this pass.
    pub removed: u64,
    pub cursor: SyncCursor,
    /// Whether this pass was a full listing rather than a delta.
    pub full_sync: bool,
}

/// Pages the remote listing into the inventory.
///
/// Paging is strictly sequential and each applied page is committed before
/// the next is fetched, so an interrupted pass loses no work: upserts are
/// idempotent and the persisted cursor always points at the last fully
/// applied page.
pub struct SyncEngine {
    remote: RemoteHandle,
    repo: Repository,
    cursors: CursorStore,
    filter: MediaFilter,
    /// Folder the listing is restricted to; `None` lists the whole store.
    root_prefix: Option<String>,
}

impl SyncEngine {
    pub fn new(
        remote: RemoteHandle,
        repo: Repository,
        cursors: CursorStore,
        filter: MediaFilter,
        root_prefix: Option<String>,
    ) -> Self {
        Self { remote, repo, cursors, filter, root_prefix }
    }

    /// Run one sync pass: a delta continuation when a cursor exists and the
    /// inventory has content, a full resync otherwise. A stale cursor
    /// (remote reset) silently falls back to a full resync.
    #[instrument(skip(self), fields(remote = self.remote.name()))]
    pub async fn sync(&self) -> Result<SyncOutcome> {
        let cursor = self.cursors.load().await.or_raise(|| ErrorKind::Store)?;
        let empty = self.repo.is_empty().await.or_raise(|| ErrorKind::Store)?;
        match cursor {
            Some(cursor) if !empty => match self.delta(&cursor).await? {
                Some(outcome) => Ok(outcome),
                None => {
                    warn!("delta cursor rejected by remote, falling back to full resync");
                    self.full_resync().await
                },
            },
            _ => self.full_resync().await,
        }
    }

    /// Force a full listing pass regardless of any persisted cursor.
    #[instrument(skip(self), fields(remote = self.remote.name()))]
    pub async fn full_resync(&self) -> Result<SyncOutcome> {
        info!("starting full resync");
        let mut changed = Vec::new();
        let mut removed = 0;
        let mut page =
            self.remote.list_page(self.root_prefix.as_deref()).await.or_raise(|| ErrorKind::Remote)?;
        loop {
            let (upserted, deleted) = self.apply_page(&page, true, &mut changed).await?;
            debug!(upserted, deleted, has_more = page.has_more, "applied full listing page");
            removed += deleted;
            if !page.has_more {
                break;
            }
            page = self.remote.continue_page(&page.cursor).await.or_raise(|| ErrorKind::Remote)?;
        }
        // The final page carries the token future delta passes resume from.
        let cursor = SyncCursor::new(page.cursor, true);
        self.cursors.save(&cursor).await.or_raise(|| ErrorKind::Store)?;
        info!(files = changed.len(), "full resync complete");
        Ok(SyncOutcome { changed, removed, cursor, full_sync: true })
    }

    /// Continue from a persisted cursor. `Ok(None)` means the remote no
    /// longer honors the cursor and the caller must fall back to a full
    /// resync.
    async fn delta(&self, from: &SyncCursor) -> Result<Option<SyncOutcome>> {
        let mut changed = Vec::new();
        let mut removed = 0;
        let mut token = from.token.clone();
        let mut cursor = from.clone();
        loop {
            let page = match self.remote.continue_page(&token).await {
                Ok(page) => page,
                Err(err) if matches!(&*err, glimpse_remote::error::ErrorKind::CursorReset) => {
                    return Ok(None);
                },
                Err(err) => return Err(err).or_raise(|| ErrorKind::Remote),
            };
            let (upserted, deleted) = self.apply_page(&page, false, &mut changed).await?;
            debug!(upserted, deleted, has_more = page.has_more, "applied delta page");
            removed += deleted;
            // Persist after every applied page: an interruption resumes
            // here instead of re-fetching the whole delta.
            cursor = SyncCursor::new(page.cursor.clone(), false);
            self.cursors.save(&cursor).await.or_raise(|| ErrorKind::Store)?;
            if !page.has_more {
                break;
            }
            token = page.cursor;
        }
        info!(upserted = changed.len(), removed, "delta sync complete");
        Ok(Some(SyncOutcome { changed, removed, cursor, full_sync: false }))
    }

    /// Apply one page's entries: upserts in a single inventory transaction,
    /// then the deletions.
    async fn apply_page(
        &self,
        page: &ListPage,
        full_sync: bool,
        changed: &mut Vec<RemoteFileRecord>,
    ) -> Result<(u64, u64)> {
        let mut upserts = Vec::new();
        let mut deletions = Vec::new();
        for entry in &page.entries {
            match entry {
                ListEntry::File(record) => {
                    if let Some(record) = self.filter.classify(record.clone()) {
                        upserts.push(record);
                    }
                },
                ListEntry::Removed(normalized) => deletions.push(normalized.clone()),
            }
        }
        let upserted = self.repo.upsert_many(&upserts, full_sync).await.or_raise(|| ErrorKind::Store)?;
        let mut deleted = 0;
        for path in &deletions {
            if self.repo.remove(path).await.or_raise(|| ErrorKind::Store)? {
                deleted += 1;
            }
        }
        changed.extend(upserts);
        Ok((upserted, deleted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimpse_inventory::Database;
    use glimpse_remote::client::MockRemote;
    use std::sync::Arc;

    fn default_filter() -> MediaFilter {
        MediaFilter {
            image_extensions: vec!["jpg".to_string(), "png".to_string()],
            video_extensions: vec!["mp4".to_string()],
        }
    }

    async fn engine_with(remote: MockRemote) -> (Database, Arc<MockRemote>, SyncEngine) {
        let db = Database::connect_in_memory().await.unwrap();
        let remote = Arc::new(remote);
        let engine = SyncEngine::new(
            remote.clone(),
            Repository::from(&db),
            CursorStore::from(&db),
            default_filter(),
            None,
        );
        (db, remote, engine)
    }

    #[tokio::test]
    async fn test_empty_inventory_full_resync() {
        let remote = MockRemote::with_files([("Photos/a.jpg", Some("fp-a")), ("Clips/b.mp4", None)]);
        let (db, _remote, engine) = engine_with(remote).await;
        let outcome = engine.sync().await.unwrap();
        assert!(outcome.full_sync);
        assert_eq!(outcome.changed.len(), 2);
        assert!(outcome.cursor.is_full_sync);
        let repo = Repository::from(&db);
        assert_eq!(repo.list(None, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delta_applies_changes_and_deletions() {
        let remote = MockRemote::with_files([("Photos/a.jpg", Some("v1"))]);
        let (db, remote, engine) = engine_with(remote).await;
        engine.sync().await.unwrap();

        remote.put("Photos/b.jpg", 10, Some("fp-b")).await;
        remote.remove("Photos/a.jpg").await;
        let outcome = engine.sync().await.unwrap();
        assert!(!outcome.full_sync);
        assert_eq!(outcome.changed.len(), 1);
        assert_eq!(outcome.changed[0].normalized_path, "photos/b.jpg");
        assert_eq!(outcome.removed, 1);
        let repo = Repository::from(&db);
        let files = repo.list(None, None).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].record.normalized_path, "photos/b.jpg");
    }

    #[tokio::test]
    async fn test_zero_change_delta_is_success() {
        let remote = MockRemote::with_files([("Photos/a.jpg", None)]);
        let (_db, _remote, engine) = engine_with(remote).await;
        engine.sync().await.unwrap();
        let outcome = engine.sync().await.unwrap();
        assert!(!outcome.full_sync);
        assert!(outcome.changed.is_empty());
        assert_eq!(outcome.removed, 0);
    }

    #[tokio::test]
    async fn test_two_step_delta_equals_one_pass() {
        let remote = MockRemote::with_files([("a.jpg", None)]);
        let (db, remote, engine) = engine_with(remote).await;
        engine.sync().await.unwrap();

        remote.put("b.jpg", 10, None).await;
        engine.sync().await.unwrap();
        remote.put("c.jpg", 10, None).await;
        let outcome = engine.sync().await.unwrap();
        // second step only sees the change after the first step's cursor
        assert_eq!(outcome.changed.len(), 1);
        assert_eq!(outcome.changed[0].normalized_path, "c.jpg");
        let repo = Repository::from(&db);
        assert_eq!(repo.list(None, None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_cursor_reset_falls_back_to_full_resync() {
        let remote = MockRemote::with_files([("a.jpg", None)]);
        let (db, remote, engine) = engine_with(remote).await;
        engine.sync().await.unwrap();

        remote.put("b.jpg", 10, None).await;
        remote.expire_cursors().await;
        let outcome = engine.sync().await.unwrap();
        assert!(outcome.full_sync);
        assert_eq!(outcome.changed.len(), 2);
        let repo = Repository::from(&db);
        assert_eq!(repo.list(None, None).await.unwrap().len(), 2);
        // the fresh cursor works for the next delta
        let outcome = engine.sync().await.unwrap();
        assert!(!outcome.full_sync);
        assert!(outcome.changed.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_extensions_filtered() {
        let remote = MockRemote::with_files([("a.jpg", None), ("b.gif", None)]);
        let (db, _remote, engine) = engine_with(remote).await;
        // gif is a default image kind but not in the configured set
        let outcome = engine.sync().await.unwrap();
        assert_eq!(outcome.changed.len(), 1);
        let repo = Repository::from(&db);
        assert_eq!(repo.list(None, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_configured_extension_beyond_defaults_synced() {
        let remote = MockRemote::new().with_extensions(["jpg", "heic"], ["mp4"]);
        remote.put("Photos/a.heic", 10, Some("fp-a")).await;
        let db = Database::connect_in_memory().await.unwrap();
        let filter = MediaFilter {
            image_extensions: vec!["jpg".to_string(), "heic".to_string()],
            video_extensions: vec!["mp4".to_string()],
        };
        let engine = SyncEngine::new(
            Arc::new(remote),
            Repository::from(&db),
            CursorStore::from(&db),
            filter,
            None,
        );
        let outcome = engine.sync().await.unwrap();
        assert_eq!(outcome.changed.len(), 1);
        assert_eq!(outcome.changed[0].kind, FileKind::Image);
        let repo = Repository::from(&db);
        let files = repo.list(None, None).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].record.normalized_path, "photos/a.heic");
    }

    #[tokio::test]
    async fn test_paginated_full_resync() {
        let remote = MockRemote::with_files([
            ("a.jpg", None),
            ("b.jpg", None),
            ("c.jpg", None),
            ("d.mp4", None),
            ("e.mp4", None),
        ])
        .with_page_size(2);
        let (db, _remote, engine) = engine_with(remote).await;
        let outcome = engine.sync().await.unwrap();
        assert_eq!(outcome.changed.len(), 5);
        let repo = Repository::from(&db);
        assert_eq!(repo.list(None, None).await.unwrap().len(), 5);
    }
}
