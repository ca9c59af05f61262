//! Per-file enrichment workflow.

use crate::dedup::{DedupDecision, DedupPolicy};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use glimpse_enrich::{
    tags, CaptionerHandle, EmbedderHandle, EnrichedFileRecord, FramePolicy, FrameExtractorHandle,
    META_FINGERPRINT, META_PROCESSING_URL,
};
use glimpse_remote::{FileKind, RemoteFileRecord, RemoteHandle, Representation, ThumbnailSize};
use glimpse_vector::VectorHandle;
use time::UtcDateTime;
use tracing::{debug, warn};

/// How one file's workflow ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Dedup decided the existing record is current; nothing was spent.
    Skipped,
    /// Enriched and stored under the returned vector-store id.
    Stored(String),
    /// Enrichment ran but produced no embedding; nothing was stored.
    NoEmbedding,
}

/// Runs the caption/tags/embedding workflow for single files.
///
/// Every failure is scoped to the file it occurred on. The batch layer
/// collects these per task and never lets one file's error touch another.
pub struct FileProcessor {
    remote: RemoteHandle,
    captioner: CaptionerHandle,
    embedder: EmbedderHandle,
    frames: FrameExtractorHandle,
    vectors: VectorHandle,
    dedup: DedupPolicy,
    frame_policy: FramePolicy,
    use_thumbnails: bool,
    thumbnail_size: ThumbnailSize,
}

impl FileProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        remote: RemoteHandle,
        captioner: CaptionerHandle,
        embedder: EmbedderHandle,
        frames: FrameExtractorHandle,
        vectors: VectorHandle,
        dedup: DedupPolicy,
        frame_policy: FramePolicy,
        use_thumbnails: bool,
        thumbnail_size: ThumbnailSize,
    ) -> Self {
        Self {
            remote,
            captioner,
            embedder,
            frames,
            vectors,
            dedup,
            frame_policy,
            use_thumbnails,
            thumbnail_size,
        }
    }

    /// Run the full workflow for one file.
    pub async fn process_file(&self, record: &RemoteFileRecord) -> Result<FileOutcome> {
        let existing =
            self.vectors.get_by_path(&record.normalized_path).await.or_raise(|| ErrorKind::Vector)?;
        if self.dedup.decide(existing.as_ref(), record.content_fingerprint.as_deref())
            == DedupDecision::Skip
        {
            debug!(path = %record.path, "skipping duplicate");
            return Ok(FileOutcome::Skipped);
        }

        // No representation, no enrichment: terminal for this file.
        let source = self
            .remote
            .representation(&record.path)
            .await
            .or_raise(|| ErrorKind::Enrichment(record.path.clone()))?;

        let (caption, file_tags, embedding, thumbnail) = match record.kind {
            FileKind::Image => self.enrich_image(record, &source).await?,
            FileKind::Video => self.enrich_video(record, &source).await?,
        };

        if embedding.is_empty() {
            warn!(path = %record.path, "no embedding produced, not storing");
            return Ok(FileOutcome::NoEmbedding);
        }

        let mut metadata = serde_json::Map::new();
        if let Some(fingerprint) = &record.content_fingerprint {
            metadata.insert(META_FINGERPRINT.to_string(), fingerprint.clone().into());
        }
        metadata.insert(META_PROCESSING_URL.to_string(), source.to_string().into());

        let enriched = EnrichedFileRecord {
            // The store reuses the existing id for this path; empty means
            // "assign one".
            id: existing.map(|e| e.id).unwrap_or_default(),
            path: record.path.clone(),
            normalized_path: record.normalized_path.clone(),
            name: record.name.clone(),
            kind: record.kind,
            caption: Some(caption),
            tags: file_tags,
            embedding,
            processed_at: UtcDateTime::now(),
            public_url: match &source {
                Representation::Url(url) => Some(url.clone()),
                Representation::Local(_) => None,
            },
            thumbnail_url: thumbnail,
            metadata,
        };
        let id = self.vectors.upsert(enriched).await.or_raise(|| ErrorKind::Vector)?;
        debug!(path = %record.path, id = %id, "stored enriched record");
        Ok(FileOutcome::Stored(id))
    }

    /// Caption from the cheapest usable representation, embed from the
    /// image content itself.
    async fn enrich_image(
        &self,
        record: &RemoteFileRecord,
        source: &Representation,
    ) -> Result<(String, Vec<String>, Vec<f32>, Option<String>)> {
        let (caption_repr, thumbnail_url) = match self.thumbnail_for(record).await {
            Some(thumb) => {
                let url = match &thumb {
                    Representation::Url(url) => Some(url.clone()),
                    Representation::Local(_) => None,
                };
                (thumb, url)
            },
            None => (source.clone(), None),
        };
        let caption = self
            .captioner
            .caption(&caption_repr)
            .await
            .or_raise(|| ErrorKind::Enrichment(record.path.clone()))?;
        let file_tags = tags::extract(&caption);
        let embedding = self
            .embedder
            .embed_image(source)
            .await
            .or_raise(|| ErrorKind::Enrichment(record.path.clone()))?;
        Ok((caption, file_tags, embedding, thumbnail_url))
    }

    /// Sample frames per policy, caption each, stitch the narrative, and
    /// embed the narrative text.
    async fn enrich_video(
        &self,
        record: &RemoteFileRecord,
        source: &Representation,
    ) -> Result<(String, Vec<String>, Vec<f32>, Option<String>)> {
        let duration = self
            .frames
            .duration_secs(source)
            .await
            .or_raise(|| ErrorKind::Enrichment(record.path.clone()))?;
        let mut frame_captions = Vec::new();
        for at_secs in self.frame_policy.plan(duration) {
            // A bad frame costs one sample, not the whole video.
            let caption = async {
                let frame = self.frames.extract_frame(source, at_secs).await?;
                self.captioner.caption(&frame).await
            }
            .await;
            match caption {
                Ok(caption) => frame_captions.push(caption),
                Err(err) => {
                    warn!(path = %record.path, at_secs, error = %err, "frame caption failed")
                },
            }
        }
        let caption = glimpse_enrich::stitch(&frame_captions);
        let frame_tags = frame_captions.iter().map(|c| tags::extract(c));
        let file_tags = tags::union(
            std::iter::once(tags::extract(&caption))
                .chain(frame_tags)
                .chain(std::iter::once(vec!["video".to_string()])),
        );
        let embedding = self
            .embedder
            .embed_text(&caption)
            .await
            .or_raise(|| ErrorKind::Enrichment(record.path.clone()))?;
        Ok((caption, file_tags, embedding, None))
    }

    /// The thumbnail representation for captioning, when enabled and
    /// available. Any thumbnail failure falls back to the full content.
    async fn thumbnail_for(&self, record: &RemoteFileRecord) -> Option<Representation> {
        if !self.use_thumbnails {
            return None;
        }
        match self.remote.thumbnail(&record.path, self.thumbnail_size).await {
            Ok(thumb) => thumb,
            Err(err) => {
                warn!(path = %record.path, error = %err, "thumbnail unavailable, using full content");
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimpse_enrich::mock::{MockCaptioner, MockEmbedder, MockFrameExtractor};
    use glimpse_remote::client::MockRemote;
    use glimpse_vector::{MemoryVectorStore, VectorStore};
    use std::sync::Arc;
    use time::UtcDateTime;

    struct Fixture {
        remote: Arc<MockRemote>,
        captioner: Arc<MockCaptioner>,
        embedder: Arc<MockEmbedder>,
        frames: Arc<MockFrameExtractor>,
        vectors: Arc<MemoryVectorStore>,
    }

    impl Fixture {
        fn new(remote: MockRemote) -> Self {
            Self {
                remote: Arc::new(remote),
                captioner: Arc::new(MockCaptioner::new()),
                embedder: Arc::new(MockEmbedder::new()),
                frames: Arc::new(MockFrameExtractor::new()),
                vectors: Arc::new(MemoryVectorStore::new()),
            }
        }

        fn processor(&self, dedup: DedupPolicy) -> FileProcessor {
            FileProcessor::new(
                self.remote.clone(),
                self.captioner.clone(),
                self.embedder.clone(),
                self.frames.clone(),
                self.vectors.clone(),
                dedup,
                FramePolicy::default(),
                true,
                ThumbnailSize::Medium,
            )
        }
    }

    fn both_flags() -> DedupPolicy {
        DedupPolicy { skip_duplicates: true, track_fingerprint: true }
    }

    fn record(path: &str, fingerprint: Option<&str>) -> RemoteFileRecord {
        RemoteFileRecord::from_listing(
            format!("id:{path}"),
            path,
            1024,
            UtcDateTime::now(),
            fingerprint.map(str::to_string),
        )
        .unwrap()
        .unwrap()
    }

    #[tokio::test]
    async fn test_image_workflow_stores_record() {
        let fixture = Fixture::new(MockRemote::with_files([("Photos/a.jpg", Some("fp-a"))]));
        fixture.captioner.with_caption("a.jpg", "a dog running on the beach").await;
        let processor = fixture.processor(both_flags());
        let outcome = processor.process_file(&record("Photos/a.jpg", Some("fp-a"))).await.unwrap();
        let FileOutcome::Stored(id) = outcome else { panic!("expected stored outcome") };
        let stored = fixture.vectors.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.caption.as_deref(), Some("a dog running on the beach"));
        assert_eq!(stored.tags, vec!["dog", "running", "beach"]);
        assert!(!stored.embedding.is_empty());
        assert_eq!(stored.fingerprint(), Some("fp-a"));
        assert_eq!(stored.public_url.as_deref(), Some("mock://share/photos/a.jpg?dl=1"));
        assert!(stored.thumbnail_url.as_deref().unwrap().starts_with("mock://thumb/medium/"));
    }

    #[tokio::test]
    async fn test_video_workflow_stitches_and_tags() {
        let fixture = Fixture::new(MockRemote::with_files([("Clips/dog.mp4", Some("fp-v"))]));
        // 8s clip: frames at 0.8 and 4.0
        fixture.frames.with_duration("dog.mp4", 8.0).await;
        fixture.captioner.with_caption("frame://0.8", "a dog running").await;
        fixture.captioner.with_caption("frame://4.0", "a dog jumping").await;
        let processor = fixture.processor(both_flags());
        let outcome = processor.process_file(&record("Clips/dog.mp4", Some("fp-v"))).await.unwrap();
        assert!(matches!(outcome, FileOutcome::Stored(_)));
        let stored = fixture.vectors.get_by_path("clips/dog.mp4").await.unwrap().unwrap();
        assert_eq!(stored.caption.as_deref(), Some("Video showing a dog running, then a dog jumping"));
        assert!(stored.tags.contains(&"video".to_string()));
        assert!(stored.tags.contains(&"dog".to_string()));
        assert!(stored.tags.contains(&"jumping".to_string()));
        assert!(!stored.embedding.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_skipped_and_reprocessed_on_change() {
        let fixture = Fixture::new(MockRemote::with_files([("a.jpg", Some("v1"))]));
        let processor = fixture.processor(both_flags());
        let first = processor.process_file(&record("a.jpg", Some("v1"))).await.unwrap();
        let FileOutcome::Stored(first_id) = first else { panic!("expected stored outcome") };

        // same fingerprint: skip
        let again = processor.process_file(&record("a.jpg", Some("v1"))).await.unwrap();
        assert_eq!(again, FileOutcome::Skipped);

        // changed fingerprint: reprocess in place under the same id
        let changed = processor.process_file(&record("a.jpg", Some("v2"))).await.unwrap();
        assert_eq!(changed, FileOutcome::Stored(first_id));
        assert_eq!(fixture.vectors.count(None).await.unwrap(), 1);
        let stored = fixture.vectors.get_by_path("a.jpg").await.unwrap().unwrap();
        assert_eq!(stored.fingerprint(), Some("v2"));
    }

    #[tokio::test]
    async fn test_no_embedding_means_no_upsert() {
        let fixture = Fixture::new(MockRemote::with_files([("a.jpg", None)]));
        fixture.embedder.empty_for("a.jpg").await;
        let processor = fixture.processor(both_flags());
        let outcome = processor.process_file(&record("a.jpg", None)).await.unwrap();
        assert_eq!(outcome, FileOutcome::NoEmbedding);
        assert_eq!(fixture.vectors.count(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_caption_failure_is_per_file_error() {
        let fixture = Fixture::new(MockRemote::with_files([("a.jpg", None)]));
        fixture.captioner.fail_for("a.jpg").await;
        let processor = fixture.processor(both_flags());
        let err = processor.process_file(&record("a.jpg", None)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Enrichment(path) if path == "a.jpg"));
        assert_eq!(fixture.vectors.count(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_frame_does_not_fail_video() {
        let fixture = Fixture::new(MockRemote::with_files([("clip.mp4", None)]));
        fixture.frames.with_duration("clip.mp4", 8.0).await;
        fixture.captioner.fail_for("frame://0.8").await;
        fixture.captioner.with_caption("frame://4.0", "a sunset").await;
        let processor = fixture.processor(both_flags());
        let outcome = processor.process_file(&record("clip.mp4", None)).await.unwrap();
        assert!(matches!(outcome, FileOutcome::Stored(_)));
        let stored = fixture.vectors.get_by_path("clip.mp4").await.unwrap().unwrap();
        assert_eq!(stored.caption.as_deref(), Some("Video showing a sunset"));
    }
}
