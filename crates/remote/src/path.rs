//! Remote path validation and normalization.
//!
//! Remote paths are `/`-separated, relative to the listing root, and
//! case-preserving. The case-folded form of a path is the unique lookup key
//! everywhere else in the system (inventory rows, dedup, vector records),
//! because the remote store treats paths case-insensitively.

use crate::error::{ErrorKind, Result};

/// Validates a remote path and returns its canonical, case-preserving form.
///
/// Leading/trailing/duplicate separators and `.` components are removed and
/// `..` components are resolved. Paths that escape the listing root, contain
/// null bytes, or resolve to nothing are rejected with
/// [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
pub fn canonical(path: impl AsRef<str>) -> Result<String> {
    let raw = path.as_ref();
    if raw.contains('\0') {
        exn::bail!(ErrorKind::InvalidPath(raw.to_string()));
    }
    let mut components: Vec<&str> = Vec::new();
    for component in raw.split('/') {
        match component {
            "" | "." => {},
            ".." => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(raw.to_string()));
                }
            },
            normal => components.push(normal),
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(raw.to_string())),
        false => Ok(components.join("/")),
    }
}

/// Validates a remote path and returns the case-folded lookup key.
///
/// # Examples
///
/// ```
/// use glimpse_remote::normalize_path;
/// assert_eq!(normalize_path("/Photos/Cat.JPG").unwrap(), "photos/cat.jpg");
/// assert!(normalize_path("../escape").is_err());
/// ```
pub fn normalize(path: impl AsRef<str>) -> Result<String> {
    Ok(canonical(path)?.to_lowercase())
}

/// Extension of a path, lowercased, without the leading dot.
///
/// Returns an empty string when the file name has no extension.
pub fn extension(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Photos/Cat.JPG", "Photos/Cat.JPG")]
    #[case("/Photos/Cat.JPG", "Photos/Cat.JPG")]
    #[case("a//b/./c/", "a/b/c")]
    #[case("a/b/../c", "a/c")]
    fn test_canonical(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(canonical(input).unwrap(), expected);
    }

    #[rstest]
    #[case("../etc/passwd")]
    #[case("a/../../b")]
    #[case("")]
    #[case("/")]
    #[case(".")]
    #[case("a\0b")]
    fn test_invalid(#[case] input: &str) {
        let err = canonical(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_normalize_case_folds() {
        assert_eq!(normalize("/Photos/Summer/IMG_01.JPG").unwrap(), "photos/summer/img_01.jpg");
    }

    #[rstest]
    #[case("Photos/Cat.JPG", "jpg")]
    #[case("clip.MOV", "mov")]
    #[case("archive.tar.gz", "gz")]
    #[case("README", "")]
    #[case("dir/.hidden", "")]
    fn test_extension(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(extension(input), expected);
    }
}
