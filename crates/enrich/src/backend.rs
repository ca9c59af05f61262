//! Enrichment backend contracts.
//!
//! These traits are the seams to the vision, embedding, and video services.
//! Real deployments implement them over HTTP APIs and a media toolchain;
//! tests use the in-memory mocks behind the `mock` feature.

use crate::error::Result;
use async_trait::async_trait;
use glimpse_remote::Representation;
use std::sync::Arc;

/// Produces a one-sentence scene description for an image representation.
#[async_trait]
pub trait Captioner: Send + Sync {
    async fn caption(&self, representation: &Representation) -> Result<String>;
}

/// Produces embedding vectors for images and text.
///
/// An empty vector is a valid response meaning "no embedding available";
/// callers must not persist a record for it.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_image(&self, representation: &Representation) -> Result<Vec<f32>>;
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>>;
}

/// Reads video durations and extracts single frames as image
/// representations.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    async fn duration_secs(&self, representation: &Representation) -> Result<f64>;
    async fn extract_frame(&self, representation: &Representation, at_secs: f64) -> Result<Representation>;
}

pub type CaptionerHandle = Arc<dyn Captioner>;
pub type EmbedderHandle = Arc<dyn Embedder>;
pub type FrameExtractorHandle = Arc<dyn FrameExtractor>;
