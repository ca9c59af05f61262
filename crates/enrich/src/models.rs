use glimpse_remote::FileKind;
use serde::{Deserialize, Serialize};
use time::UtcDateTime;

/// Metadata key recording the content fingerprint at processing time.
pub const META_FINGERPRINT: &str = "content_fingerprint";
/// Metadata key recording which representation enrichment actually used.
pub const META_PROCESSING_URL: &str = "processing_url";

/// A fully enriched file, as stored in the vector index.
///
/// Exactly one record exists per normalized path; re-processing a file
/// updates the existing record in place (matched by path, never by remote
/// id). `embedding` is never empty in a persisted record: a file that
/// yields no embedding is not stored at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedFileRecord {
    /// Vector-store identifier, assigned on first insert and kept on update.
    pub id: String,
    pub path: String,
    pub normalized_path: String,
    pub name: String,
    pub kind: FileKind,
    pub caption: Option<String>,
    /// Set semantics; order follows extraction order.
    pub tags: Vec<String>,
    pub embedding: Vec<f32>,
    pub processed_at: UtcDateTime,
    pub public_url: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Free-form extras, including [`META_FINGERPRINT`] and
    /// [`META_PROCESSING_URL`].
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl EnrichedFileRecord {
    /// Fingerprint recorded when this record was processed, if any.
    pub fn fingerprint(&self) -> Option<&str> {
        self.metadata.get(META_FINGERPRINT).and_then(|v| v.as_str())
    }
}
