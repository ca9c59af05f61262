//! Vector index over enriched media records.
//!
//! [`VectorStore`] is the seam to whatever similarity index a deployment
//! uses; [`MemoryVectorStore`] is a complete in-process implementation used
//! both standalone and in tests.

pub mod error;
mod memory;
mod store;

pub use crate::memory::MemoryVectorStore;
pub use crate::store::{SearchHit, VectorStore};
use std::sync::Arc;

pub type VectorHandle = Arc<dyn VectorStore>;
