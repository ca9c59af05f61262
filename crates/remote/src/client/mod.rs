//! Remote store client trait and implementations.
//!
//! This module defines the [`RemoteStore`] trait, the narrow contract through
//! which the sync engine and the enrichment pipeline talk to the remote
//! object store. Real deployments implement it over an HTTP API; tests use
//! the in-memory [`MockRemote`].

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use self::mock::MockRemote;
use crate::error::Result;
use crate::models::{ListPage, RemoteFileRecord, Representation, ThumbnailSize};
use async_trait::async_trait;

/// Unified interface to the remote file store.
///
/// All operations are asynchronous and must enforce a bounded timeout
/// internally; a timeout surfaces as
/// [`ErrorKind::Timeout`](crate::error::ErrorKind::Timeout) and is treated by
/// callers as a per-file failure, never a run-level one.
///
/// # Paging
///
/// [`list_page`](Self::list_page) starts a full listing pass;
/// [`continue_page`](Self::continue_page) fetches the next page of either a
/// full listing or a delta. Paging is strictly sequential: each page's
/// `cursor` is required to fetch the next. The cursor on the *final* page of
/// a pass is the token future delta syncs resume from. A stale delta cursor
/// fails with [`ErrorKind::CursorReset`](crate::error::ErrorKind::CursorReset),
/// which the sync engine answers with a fresh full listing.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Name of the configured remote (used for logging only).
    fn name(&self) -> &str;

    /// Start a full listing pass, optionally restricted to a folder prefix.
    async fn list_page(&self, prefix: Option<&str>) -> Result<ListPage>;

    /// Fetch the next page for a previously issued cursor.
    async fn continue_page(&self, cursor: &str) -> Result<ListPage>;

    /// Metadata for a single file, or `None` if the path does not exist or
    /// is not a supported media kind.
    async fn get_metadata(&self, path: &str) -> Result<Option<RemoteFileRecord>>;

    /// A locally accessible or publicly fetchable representation of the
    /// file's content (e.g. a share link). Failure here is terminal for the
    /// file being processed.
    async fn representation(&self, path: &str) -> Result<Representation>;

    /// A downsized representation suitable for cheaper captioning, if the
    /// remote can produce one.
    async fn thumbnail(&self, path: &str, size: ThumbnailSize) -> Result<Option<Representation>>;
}
