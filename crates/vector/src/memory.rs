//! In-memory vector store.
//!
//! Cosine-similarity search over a map of records. Fine for moderate
//! libraries and for tests; a persistent index can replace it behind the
//! same trait.

use crate::error::{ErrorKind, Result};
use crate::store::{SearchHit, VectorStore};
use async_trait::async_trait;
use glimpse_enrich::EnrichedFileRecord;
use glimpse_remote::FileKind;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryVectorStore {
    /// Keyed by normalized path.
    records: RwLock<HashMap<String, EnrichedFileRecord>>,
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some(dot / (norm_a * norm_b))
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ranked(mut hits: Vec<SearchHit>, limit: usize) -> Vec<SearchHit> {
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        hits
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, mut record: EnrichedFileRecord) -> Result<String> {
        if record.embedding.is_empty() {
            exn::bail!(ErrorKind::EmptyEmbedding(record.normalized_path));
        }
        let mut records = self.records.write().await;
        // A path keeps its id for its whole life in the index.
        record.id = match records.get(&record.normalized_path) {
            Some(existing) => existing.id.clone(),
            None if record.id.is_empty() => uuid::Uuid::new_v4().to_string(),
            None => record.id,
        };
        let id = record.id.clone();
        records.insert(record.normalized_path.clone(), record);
        Ok(id)
    }

    async fn get_by_path(&self, normalized_path: &str) -> Result<Option<EnrichedFileRecord>> {
        Ok(self.records.read().await.get(normalized_path).cloned())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<EnrichedFileRecord>> {
        Ok(self.records.read().await.values().find(|r| r.id == id).cloned())
    }

    async fn search_by_vector(
        &self,
        query: &[f32],
        limit: usize,
        kind_filter: Option<FileKind>,
    ) -> Result<Vec<SearchHit>> {
        let records = self.records.read().await;
        let hits = records
            .values()
            .filter(|record| kind_filter.is_none_or(|kind| record.kind == kind))
            .filter_map(|record| {
                cosine_similarity(query, &record.embedding)
                    .map(|score| SearchHit { record: record.clone(), score })
            })
            .collect();
        Ok(Self::ranked(hits, limit))
    }

    async fn search_by_text(
        &self,
        query: &str,
        limit: usize,
        kind_filter: Option<FileKind>,
    ) -> Result<Vec<SearchHit>> {
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let records = self.records.read().await;
        let hits = records
            .values()
            .filter(|record| kind_filter.is_none_or(|kind| record.kind == kind))
            .filter_map(|record| {
                let caption = record.caption.as_deref().unwrap_or_default().to_lowercase();
                let matched = terms
                    .iter()
                    .filter(|term| caption.contains(term.as_str()) || record.tags.contains(term))
                    .count();
                match matched {
                    0 => None,
                    n => Some(SearchHit { record: record.clone(), score: n as f32 / terms.len() as f32 }),
                }
            })
            .collect();
        Ok(Self::ranked(hits, limit))
    }

    async fn delete(&self, normalized_path: &str) -> Result<bool> {
        Ok(self.records.write().await.remove(normalized_path).is_some())
    }

    async fn count(&self, kind_filter: Option<FileKind>) -> Result<u64> {
        let records = self.records.read().await;
        let count =
            records.values().filter(|record| kind_filter.is_none_or(|kind| record.kind == kind)).count();
        Ok(count as u64)
    }
}
