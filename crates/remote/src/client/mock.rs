//! In-memory remote store for testing.

use crate::error::{ErrorKind, Result};
use crate::models::{
    ListEntry, ListPage, RemoteFileRecord, Representation, ThumbnailSize, DEFAULT_IMAGE_EXTENSIONS,
    DEFAULT_VIDEO_EXTENSIONS,
};
use crate::path;
use async_trait::async_trait;
use std::collections::BTreeMap;
use time::UtcDateTime;
use tokio::sync::RwLock;

use crate::RemoteStore;

/// In-memory remote store for testing.
///
/// Simulates the paged listing protocol: a change journal records every
/// mutation, delta cursors are offsets into that journal, and
/// [`expire_cursors`](Self::expire_cursors) invalidates all previously issued
/// cursors the way a remote does when its listing history expires. Page size
/// is configurable so pagination paths can be exercised with small fixtures.
pub struct MockRemote {
    name: String,
    page_size: usize,
    inner: RwLock<Inner>,
}

struct Inner {
    /// Current files, keyed by normalized path.
    files: BTreeMap<String, RemoteFileRecord>,
    /// Every mutation ever applied, in order. Replaying a suffix of this
    /// journal is idempotent because entries are keyed by path.
    journal: Vec<ListEntry>,
    /// Delta cursors pointing before this offset are expired.
    reset_floor: usize,
    next_id: u64,
    /// Extension sets records are classified against when inserted.
    image_extensions: Vec<String>,
    video_extensions: Vec<String>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            files: BTreeMap::new(),
            journal: Vec::new(),
            reset_floor: 0,
            next_id: 0,
            image_extensions: DEFAULT_IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            video_extensions: DEFAULT_VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl Inner {
    fn build_record(&mut self, raw_path: &str, size: u64, fingerprint: Option<&str>) -> Option<RemoteFileRecord> {
        let normalized = path::normalize(raw_path).ok()?;
        // Remote ids are stable across content changes of the same path.
        let id = match self.files.get(&normalized) {
            Some(existing) => existing.id.clone(),
            None => {
                self.next_id += 1;
                format!("id:{:08}", self.next_id)
            },
        };
        RemoteFileRecord::from_listing_with(
            id,
            raw_path,
            size,
            UtcDateTime::now(),
            fingerprint.map(str::to_string),
            &self.image_extensions,
            &self.video_extensions,
        )
        .ok()
        .flatten()
    }

    fn put(&mut self, raw_path: &str, size: u64, fingerprint: Option<&str>) {
        let Some(record) = self.build_record(raw_path, size, fingerprint) else {
            // The panic here is DELIBERATE. MockRemote is intended to be used
            // in tests; fixtures with invalid or unsupported paths are a test
            // bug, not a runtime condition.
            panic!("MockRemote: invalid or unsupported media path {raw_path}");
        };
        self.files.insert(record.normalized_path.clone(), record.clone());
        self.journal.push(ListEntry::File(record));
    }
}

impl MockRemote {
    /// Create an empty mock remote.
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            page_size: 1000,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Create a mock remote pre-populated with files.
    ///
    /// Panics if any path is invalid or of an unsupported media kind; if the
    /// test setup is wrong, the test should not pass.
    ///
    /// # Example
    ///
    /// ```
    /// use glimpse_remote::client::MockRemote;
    ///
    /// let remote = MockRemote::with_files([
    ///     ("Photos/cat.jpg", Some("fp-cat")),
    ///     ("Clips/dog.mp4", None),
    /// ]);
    /// ```
    pub fn with_files<'a>(files: impl IntoIterator<Item = (&'a str, Option<&'a str>)>) -> Self {
        let remote = Self::new();
        {
            let mut inner = remote.inner.try_write().expect("lock is uncontended during construction");
            for (raw_path, fingerprint) in files {
                inner.put(raw_path, 1024, fingerprint);
            }
        }
        remote
    }

    /// Change the page size used by listing operations.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        assert!(page_size > 0, "page size must be positive");
        self.page_size = page_size;
        self
    }

    /// Replace the extension sets inserted files are classified against.
    /// Set this before inserting files; already-inserted files keep their
    /// original classification.
    pub fn with_extensions<'a>(
        self,
        images: impl IntoIterator<Item = &'a str>,
        videos: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        {
            let mut inner = self.inner.try_write().expect("lock is uncontended during construction");
            inner.image_extensions = images.into_iter().map(str::to_string).collect();
            inner.video_extensions = videos.into_iter().map(str::to_string).collect();
        }
        self
    }

    /// Insert or replace a file, recording the change in the journal.
    pub async fn put(&self, raw_path: &str, size: u64, fingerprint: Option<&str>) {
        self.inner.write().await.put(raw_path, size, fingerprint);
    }

    /// Delete a file, recording the deletion in the journal.
    pub async fn remove(&self, raw_path: &str) {
        let normalized = path::normalize(raw_path).expect("MockRemote: invalid path");
        let mut inner = self.inner.write().await;
        inner.files.remove(&normalized);
        inner.journal.push(ListEntry::Removed(normalized));
    }

    /// Invalidate every previously issued delta cursor, simulating the
    /// remote's listing history expiring.
    pub async fn expire_cursors(&self) {
        let mut inner = self.inner.write().await;
        inner.reset_floor = inner.journal.len();
    }

    fn full_cursor(index: usize, prefix: &str) -> String {
        format!("full:{index}:{prefix}")
    }

    fn delta_cursor(offset: usize, prefix: &str) -> String {
        format!("delta:{offset}:{prefix}")
    }

    fn parse_cursor(cursor: &str) -> Result<(bool, usize, String)> {
        let mut parts = cursor.splitn(3, ':');
        let kind = parts.next().unwrap_or_default();
        let position = parts.next().and_then(|n| n.parse::<usize>().ok());
        let prefix = parts.next().map(str::to_string);
        match (kind, position, prefix) {
            ("full", Some(index), Some(prefix)) => Ok((true, index, prefix)),
            ("delta", Some(offset), Some(prefix)) => Ok((false, offset, prefix)),
            _ => Err(exn::Exn::from(ErrorKind::Protocol(format!("unparseable cursor: {cursor}")))),
        }
    }

    fn matches_prefix(normalized: &str, prefix: &str) -> bool {
        // Match on folder boundaries only: "photos" must not match
        // "photosbackup/a.jpg".
        prefix.is_empty()
            || normalized == prefix
            || normalized.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
    }

    /// Page over the current file set (full listing pass).
    async fn full_page(&self, start: usize, prefix: &str) -> ListPage {
        let inner = self.inner.read().await;
        let matching: Vec<&RemoteFileRecord> = inner
            .files
            .values()
            .filter(|record| Self::matches_prefix(&record.normalized_path, prefix))
            .collect();
        let end = (start + self.page_size).min(matching.len());
        let entries = matching[start.min(end)..end].iter().map(|r| ListEntry::File((*r).clone())).collect();
        let has_more = end < matching.len();
        let cursor = match has_more {
            true => Self::full_cursor(end, prefix),
            // Final page: hand out the delta cursor future syncs resume from.
            false => Self::delta_cursor(inner.journal.len(), prefix),
        };
        ListPage { entries, cursor, has_more }
    }

    /// Page over the change journal (delta pass).
    async fn delta_page(&self, offset: usize, prefix: &str) -> Result<ListPage> {
        let inner = self.inner.read().await;
        if offset < inner.reset_floor {
            exn::bail!(ErrorKind::CursorReset);
        }
        let end = (offset + self.page_size).min(inner.journal.len());
        let entries = inner.journal[offset.min(end)..end]
            .iter()
            .filter(|entry| match entry {
                ListEntry::File(record) => Self::matches_prefix(&record.normalized_path, prefix),
                ListEntry::Removed(normalized) => Self::matches_prefix(normalized, prefix),
            })
            .cloned()
            .collect();
        Ok(ListPage {
            entries,
            cursor: Self::delta_cursor(end, prefix),
            has_more: end < inner.journal.len(),
        })
    }
}

impl Default for MockRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_page(&self, prefix: Option<&str>) -> Result<ListPage> {
        let prefix = prefix.map(path::normalize).transpose()?.unwrap_or_default();
        Ok(self.full_page(0, &prefix).await)
    }

    async fn continue_page(&self, cursor: &str) -> Result<ListPage> {
        let (is_full, position, prefix) = Self::parse_cursor(cursor)?;
        match is_full {
            true => Ok(self.full_page(position, &prefix).await),
            false => self.delta_page(position, &prefix).await,
        }
    }

    async fn get_metadata(&self, raw_path: &str) -> Result<Option<RemoteFileRecord>> {
        let normalized = path::normalize(raw_path)?;
        Ok(self.inner.read().await.files.get(&normalized).cloned())
    }

    async fn representation(&self, raw_path: &str) -> Result<Representation> {
        let normalized = path::normalize(raw_path)?;
        let inner = self.inner.read().await;
        match inner.files.contains_key(&normalized) {
            true => Ok(Representation::Url(format!("mock://share/{normalized}?dl=1"))),
            false => Err(exn::Exn::from(ErrorKind::NotFound(normalized))),
        }
    }

    async fn thumbnail(&self, raw_path: &str, size: ThumbnailSize) -> Result<Option<Representation>> {
        let normalized = path::normalize(raw_path)?;
        let inner = self.inner.read().await;
        match inner.files.contains_key(&normalized) {
            true => Ok(Some(Representation::Url(format!("mock://thumb/{size}/{normalized}")))),
            false => Err(exn::Exn::from(ErrorKind::NotFound(normalized))),
        }
    }
}
