//! Enrichment backends and the pure caption/tag logic built on top of them.
//!
//! The traits in [`backend`] are the seams to external AI services; the
//! rest of this crate is deliberately pure (tag extraction, caption
//! stitching, frame planning) so the interesting behavior tests without any
//! backend at all.

pub mod backend;
pub mod error;
pub mod frames;
#[cfg(feature = "mock")]
pub mod mock;
mod models;
pub mod stitch;
pub mod tags;

pub use crate::backend::{
    Captioner, CaptionerHandle, Embedder, EmbedderHandle, FrameExtractor, FrameExtractorHandle,
};
pub use crate::frames::FramePolicy;
pub use crate::models::{EnrichedFileRecord, META_FINGERPRINT, META_PROCESSING_URL};
pub use crate::stitch::stitch;
