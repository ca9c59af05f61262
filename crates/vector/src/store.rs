//! Vector store contract.

use crate::error::Result;
use async_trait::async_trait;
use glimpse_enrich::EnrichedFileRecord;
use glimpse_remote::FileKind;

/// One search result with its similarity score (higher is closer).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub record: EnrichedFileRecord,
    pub score: f32,
}

/// Index of enriched records, searchable by vector similarity and text.
///
/// Records are keyed by normalized path: upserting a path that already has
/// a record replaces it in place under the existing store id, so re-running
/// enrichment never creates duplicates. Storing a record with an empty
/// embedding is an error; the caller must skip such files instead.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace the record for its normalized path. Returns the
    /// store id the record ended up under.
    async fn upsert(&self, record: EnrichedFileRecord) -> Result<String>;

    async fn get_by_path(&self, normalized_path: &str) -> Result<Option<EnrichedFileRecord>>;

    async fn get_by_id(&self, id: &str) -> Result<Option<EnrichedFileRecord>>;

    /// Closest records to the query vector, best first, optionally
    /// restricted to one media kind.
    async fn search_by_vector(
        &self,
        query: &[f32],
        limit: usize,
        kind_filter: Option<FileKind>,
    ) -> Result<Vec<SearchHit>>;

    /// Keyword search over captions and tags, best first.
    async fn search_by_text(
        &self,
        query: &str,
        limit: usize,
        kind_filter: Option<FileKind>,
    ) -> Result<Vec<SearchHit>>;

    /// Remove the record for a path. Removing an absent path is not an
    /// error; returns whether a record existed.
    async fn delete(&self, normalized_path: &str) -> Result<bool>;

    /// Number of stored records, optionally restricted to one media kind.
    async fn count(&self, kind_filter: Option<FileKind>) -> Result<u64>;
}
