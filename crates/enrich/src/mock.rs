//! In-memory enrichment backends for testing.
//!
//! Scripted responses are keyed by substring match against the
//! representation's display form, so a test can target a file by its path
//! fragment ("a.jpg") or a specific frame ("frame://4.0").

use crate::backend::{Captioner, Embedder, FrameExtractor};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use glimpse_remote::Representation;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tokio::sync::RwLock;

fn scripted<'a, T>(entries: &'a [(String, T)], key: &str) -> Option<&'a T> {
    entries.iter().find(|(fragment, _)| key.contains(fragment.as_str())).map(|(_, value)| value)
}

/// Captioner returning scripted captions, with a configurable fallback.
#[derive(Default)]
pub struct MockCaptioner {
    canned: RwLock<Vec<(String, String)>>,
    failures: RwLock<Vec<String>>,
}

impl MockCaptioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a caption for any representation containing `fragment`.
    /// Earlier scripts win when several fragments match.
    pub async fn with_caption(&self, fragment: &str, caption: &str) {
        self.canned.write().await.push((fragment.to_string(), caption.to_string()));
    }

    /// Make captioning fail for any representation containing `fragment`.
    pub async fn fail_for(&self, fragment: &str) {
        self.failures.write().await.push(fragment.to_string());
    }
}

#[async_trait]
impl Captioner for MockCaptioner {
    async fn caption(&self, representation: &Representation) -> Result<String> {
        let key = representation.to_string();
        if self.failures.read().await.iter().any(|fragment| key.contains(fragment.as_str())) {
            exn::bail!(ErrorKind::Caption(format!("scripted failure for {key}")));
        }
        let canned = self.canned.read().await;
        Ok(match scripted(&canned, &key) {
            Some(caption) => caption.clone(),
            None => format!("a scene from {key}"),
        })
    }
}

/// Embedder producing deterministic vectors derived from its input.
///
/// The same input always yields the same vector, distinct inputs almost
/// always differ, and no component is zero. Inputs scripted as empty yield
/// an empty vector, which callers treat as "no embedding".
pub struct MockEmbedder {
    dims: usize,
    empty_for: RwLock<Vec<String>>,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self { dims: 8, empty_for: RwLock::new(Vec::new()) }
    }
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dims(dims: usize) -> Self {
        Self { dims, ..Self::default() }
    }

    /// Return an empty vector for any input containing `fragment`.
    pub async fn empty_for(&self, fragment: &str) {
        self.empty_for.write().await.push(fragment.to_string());
    }

    fn vector_for(&self, input: &str) -> Vec<f32> {
        (0..self.dims)
            .map(|index| {
                let mut hasher = DefaultHasher::new();
                input.hash(&mut hasher);
                index.hash(&mut hasher);
                // Map into (0, 1]; never zero so cosine distance is defined.
                ((hasher.finish() % 1000) as f32 + 1.0) / 1000.0
            })
            .collect()
    }

    async fn embed(&self, input: &str) -> Result<Vec<f32>> {
        if self.empty_for.read().await.iter().any(|fragment| input.contains(fragment.as_str())) {
            return Ok(Vec::new());
        }
        Ok(self.vector_for(input))
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed_image(&self, representation: &Representation) -> Result<Vec<f32>> {
        self.embed(&representation.to_string()).await
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(text).await
    }
}

/// Frame extractor with scripted durations.
#[derive(Default)]
pub struct MockFrameExtractor {
    durations: RwLock<Vec<(String, f64)>>,
}

impl MockFrameExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the duration for any representation containing `fragment`.
    pub async fn with_duration(&self, fragment: &str, secs: f64) {
        self.durations.write().await.push((fragment.to_string(), secs));
    }
}

#[async_trait]
impl FrameExtractor for MockFrameExtractor {
    async fn duration_secs(&self, representation: &Representation) -> Result<f64> {
        let key = representation.to_string();
        let durations = self.durations.read().await;
        match scripted(&durations, &key) {
            Some(secs) => Ok(*secs),
            None => exn::bail!(ErrorKind::Frame(format!("no scripted duration for {key}"))),
        }
    }

    async fn extract_frame(&self, representation: &Representation, at_secs: f64) -> Result<Representation> {
        Ok(Representation::Url(format!("frame://{at_secs:.1}/{representation}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Representation {
        Representation::Url(s.to_string())
    }

    #[tokio::test]
    async fn test_captioner_scripts_and_fallback() {
        let captioner = MockCaptioner::new();
        captioner.with_caption("a.jpg", "a dog running").await;
        let caption = captioner.caption(&url("mock://thumb/medium/photos/a.jpg")).await.unwrap();
        assert_eq!(caption, "a dog running");
        let fallback = captioner.caption(&url("mock://thumb/medium/photos/other.jpg")).await.unwrap();
        assert!(fallback.starts_with("a scene from"));
    }

    #[tokio::test]
    async fn test_captioner_scripted_failure() {
        let captioner = MockCaptioner::new();
        captioner.fail_for("broken.jpg").await;
        let err = captioner.caption(&url("mock://share/broken.jpg?dl=1")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Caption(_)));
    }

    #[tokio::test]
    async fn test_embedder_is_deterministic_and_nonzero() {
        let embedder = MockEmbedder::new();
        let a = embedder.embed_text("a dog running").await.unwrap();
        let b = embedder.embed_text("a dog running").await.unwrap();
        let c = embedder.embed_text("a cat sleeping").await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 8);
        assert!(a.iter().all(|&x| x > 0.0));
    }

    #[tokio::test]
    async fn test_embedder_scripted_empty() {
        let embedder = MockEmbedder::new();
        embedder.empty_for("unembeddable").await;
        let vector = embedder.embed_text("an unembeddable scene").await.unwrap();
        assert!(vector.is_empty());
    }

    #[tokio::test]
    async fn test_frame_extractor() {
        let extractor = MockFrameExtractor::new();
        extractor.with_duration("clip.mp4", 8.0).await;
        let source = url("mock://share/clip.mp4?dl=1");
        assert_eq!(extractor.duration_secs(&source).await.unwrap(), 8.0);
        let frame = extractor.extract_frame(&source, 4.0).await.unwrap();
        assert_eq!(frame.to_string(), "frame://4.0/mock://share/clip.mp4?dl=1");
        let err = extractor.duration_secs(&url("mock://share/unknown.mp4")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Frame(_)));
    }
}
