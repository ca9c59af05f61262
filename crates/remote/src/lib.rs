pub mod client;
pub mod error;
mod models;
mod path;

pub use crate::client::RemoteStore;
pub use crate::models::{
    FileKind, ListEntry, ListPage, RemoteFileRecord, Representation, ThumbnailSize,
    DEFAULT_IMAGE_EXTENSIONS, DEFAULT_VIDEO_EXTENSIONS,
};
pub use crate::path::{canonical as canonical_path, extension as path_extension, normalize as normalize_path};
use std::sync::Arc;

pub type RemoteHandle = Arc<dyn RemoteStore + Send + Sync>;
