//! These types represent remote listing entries and the records the rest of
//! the system builds from them (inventory rows, sync deltas, dedup inputs).

use crate::error::Result;
use crate::path;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use time::UtcDateTime;

/// Image extensions recognized when no explicit configuration is supplied.
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];
/// Video extensions recognized when no explicit configuration is supplied.
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "wmv", "flv"];

/// Broad media category, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Video,
}

impl FileKind {
    /// Classify an extension (lowercase, no leading dot) against explicit
    /// extension sets. Returns `None` for unsupported extensions.
    pub fn from_extension<S: AsRef<str>>(extension: &str, images: &[S], videos: &[S]) -> Option<Self> {
        if images.iter().any(|e| e.as_ref() == extension) {
            Some(Self::Image)
        } else if videos.iter().any(|e| e.as_ref() == extension) {
            Some(Self::Video)
        } else {
            None
        }
    }

    /// Classify an extension against the built-in default sets.
    pub fn from_extension_default(extension: &str) -> Option<Self> {
        Self::from_extension(extension, DEFAULT_IMAGE_EXTENSIONS, DEFAULT_VIDEO_EXTENSIONS)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FileKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            other => Err(format!("unknown file kind: {other}")),
        }
    }
}

/// One physical file in the remote store.
///
/// `normalized_path` is the case-folded lookup key and is unique within the
/// store; `path` preserves the remote's display casing. A missing
/// `content_fingerprint` means the file can never be deduplicated and is
/// reprocessed on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileRecord {
    /// Opaque remote identifier, stable across renames but *not* across
    /// duplicate-detection passes. Never used as a lookup key.
    pub id: String,
    pub name: String,
    /// Canonical, case-preserving path relative to the listing root.
    pub path: String,
    /// Case-folded form of `path`; the unique lookup key.
    pub normalized_path: String,
    pub size_bytes: u64,
    /// Remote-reported modification timestamp.
    pub modified_at: UtcDateTime,
    /// Remote-provided content hash; changes iff the content changes.
    pub content_fingerprint: Option<String>,
    pub kind: FileKind,
    /// Lowercase extension without the leading dot.
    pub extension: String,
}

impl RemoteFileRecord {
    /// Build a record from a raw listing entry, classifying the extension
    /// against the default media sets. Returns `Ok(None)` for files of
    /// unsupported kinds (they are not media and never enter the pipeline).
    pub fn from_listing(
        id: impl Into<String>,
        raw_path: &str,
        size_bytes: u64,
        modified_at: UtcDateTime,
        content_fingerprint: Option<String>,
    ) -> Result<Option<Self>> {
        Self::from_listing_with(
            id,
            raw_path,
            size_bytes,
            modified_at,
            content_fingerprint,
            DEFAULT_IMAGE_EXTENSIONS,
            DEFAULT_VIDEO_EXTENSIONS,
        )
    }

    /// Build a record from a raw listing entry, classifying the extension
    /// against explicit extension sets. Connectors that know the configured
    /// media sets use this so a non-default extension still produces a
    /// record.
    pub fn from_listing_with<S: AsRef<str>>(
        id: impl Into<String>,
        raw_path: &str,
        size_bytes: u64,
        modified_at: UtcDateTime,
        content_fingerprint: Option<String>,
        images: &[S],
        videos: &[S],
    ) -> Result<Option<Self>> {
        let canonical = path::canonical(raw_path)?;
        let extension = path::extension(&canonical);
        let Some(kind) = FileKind::from_extension(&extension, images, videos) else {
            return Ok(None);
        };
        let normalized_path = canonical.to_lowercase();
        let name = canonical.rsplit('/').next().unwrap_or(&canonical).to_string();
        Ok(Some(Self {
            id: id.into(),
            name,
            path: canonical,
            normalized_path,
            size_bytes,
            modified_at,
            content_fingerprint,
            kind,
            extension,
        }))
    }

    /// Parent folder of the file, if any (used for prefix listings).
    pub fn parent(&self) -> Option<&str> {
        self.path.rsplit_once('/').map(|(parent, _)| parent)
    }
}

/// One entry in a listing or delta page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEntry {
    /// A file that was created or modified since the cursor was issued
    /// (or simply exists, in a full listing).
    File(RemoteFileRecord),
    /// A file that was deleted; carries the case-folded path key.
    Removed(String),
}

/// One page of a (full or delta) listing.
#[derive(Debug, Clone)]
pub struct ListPage {
    pub entries: Vec<ListEntry>,
    /// Continuation token. After the final page of a pass this is the token
    /// to resume future delta syncs from.
    pub cursor: String,
    /// Whether another page must be fetched before the pass is complete.
    pub has_more: bool,
}

/// Requested thumbnail size (the remote decides exact pixel dimensions).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl ThumbnailSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for ThumbnailSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A locally accessible or publicly fetchable form of a remote file's
/// content, suitable for handing to the caption/embedding backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Representation {
    /// Publicly fetchable URL (e.g. a share link).
    Url(String),
    /// Path on the local filesystem (e.g. a downloaded temp file).
    Local(PathBuf),
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("jpg", Some(FileKind::Image))]
    #[case("webp", Some(FileKind::Image))]
    #[case("mov", Some(FileKind::Video))]
    #[case("flv", Some(FileKind::Video))]
    #[case("pdf", None)]
    #[case("", None)]
    fn test_kind_from_extension(#[case] ext: &str, #[case] expected: Option<FileKind>) {
        assert_eq!(FileKind::from_extension_default(ext), expected);
    }

    #[test]
    fn test_kind_respects_configured_sets() {
        let images = vec!["jpg".to_string()];
        let videos = vec!["mov".to_string()];
        assert_eq!(FileKind::from_extension("jpg", &images, &videos), Some(FileKind::Image));
        // png is an image by default, but not in this configuration
        assert_eq!(FileKind::from_extension("png", &images, &videos), None);
    }

    #[test]
    fn test_from_listing_supported() {
        let record = RemoteFileRecord::from_listing("id:1", "/Photos/Cat.JPG", 1024, UtcDateTime::now(), None)
            .unwrap()
            .expect("jpg is a supported kind");
        assert_eq!(record.path, "Photos/Cat.JPG");
        assert_eq!(record.normalized_path, "photos/cat.jpg");
        assert_eq!(record.name, "Cat.JPG");
        assert_eq!(record.extension, "jpg");
        assert_eq!(record.kind, FileKind::Image);
        assert_eq!(record.parent(), Some("Photos"));
    }

    #[test]
    fn test_from_listing_unsupported_kind() {
        let record =
            RemoteFileRecord::from_listing("id:2", "Documents/notes.txt", 10, UtcDateTime::now(), None).unwrap();
        assert!(record.is_none());
    }

    #[test]
    fn test_from_listing_with_configured_sets() {
        let images = vec!["heic".to_string()];
        let videos: Vec<String> = Vec::new();
        // heic is not in the default set, but an explicit set admits it
        assert!(RemoteFileRecord::from_listing("id:3", "Photos/a.heic", 10, UtcDateTime::now(), None)
            .unwrap()
            .is_none());
        let record = RemoteFileRecord::from_listing_with(
            "id:3",
            "Photos/a.heic",
            10,
            UtcDateTime::now(),
            None,
            &images,
            &videos,
        )
        .unwrap()
        .expect("configured set admits heic");
        assert_eq!(record.kind, FileKind::Image);
        assert_eq!(record.extension, "heic");
    }
}
