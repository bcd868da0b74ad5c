//! Files yielded by storage backends when listing a tree.

use std::path::PathBuf;

/// A regular file found while listing a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Relative path from storage root
    pub path: PathBuf,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Lower-cased extension of the file, if it has one.
    pub fn extension(&self) -> Option<String> {
        self.path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a/cat.jpg", Some("jpg"))]
    #[case("a/dog.PNG", Some("png"))]
    #[case("README", None)]
    // Dotfiles have no extension.
    #[case(".jpg", None)]
    fn test_extension(#[case] path: &str, #[case] expected: Option<&str>) {
        let info = FileInfo::new(path);
        assert_eq!(info.extension().as_deref(), expected);
    }
}
