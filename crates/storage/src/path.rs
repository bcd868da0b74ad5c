//! Path validation for storage trees.
//!
//! Record paths are always stored relative to a tree root. Anything that
//! would resolve outside that root is rejected before it reaches the
//! filesystem.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates and normalizes a path relative to a storage root.
///
/// `.` and repeated separators are dropped, `..` is resolved lexically, and
/// the result must still be inside the root and non-empty. Null bytes are
/// rejected explicitly.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use kodak_storage::validate_path;
/// assert!(validate_path("holiday/beach.jpg").is_ok());
/// assert!(validate_path("holiday/../beach.jpg").is_ok());
/// assert!(validate_path("../beach.jpg").is_err());
/// assert_eq!(
///     validate_path("./holiday//2024/../beach.jpg").unwrap(),
///     Path::new("holiday/beach.jpg")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(original.to_path_buf());
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            Component::Normal(segment) => {
                // Null bytes survive Path::components() on Unix but truncate
                // paths in C-based syscalls.
                if segment.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                components.push(segment);
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(invalid());
    }
    Ok(components.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a/cat.jpg", "a/cat.jpg")]
    #[case("a//b//cat.jpg", "a/b/cat.jpg")]
    #[case("./a/./cat.jpg", "a/cat.jpg")]
    #[case("a/b/..", "a")]
    #[case("a-cat/thumb.jpeg/", "a-cat/thumb.jpeg")]
    fn test_normalizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate(input).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case("../etc/passwd")]
    #[case("a/../../b")]
    #[case("..")]
    #[case("a\0b")]
    #[case("")]
    #[case(".")]
    #[case("//")]
    fn test_rejects(#[case] input: &str) {
        let err = validate(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_absolute_paths_are_made_relative() {
        // Records never store absolute paths; a leading root is dropped.
        assert_eq!(validate("/a/cat.jpg").unwrap(), Path::new("a/cat.jpg"));
    }
}
