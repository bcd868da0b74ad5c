//! Layout of the content tree.
//!
//! Everything generated for a source lives in a directory named after it:
//!
//! ```text
//! {content}/{source name}/original.{ext}    exposed original (link)
//! {content}/{source name}/{manip}.{ext}     generated manip
//! ```

use kodak_manip::{ImageFormat, ORIGINAL};
use std::path::PathBuf;

/// Directory holding everything generated for a source.
pub fn content_dir(source_name: &str) -> PathBuf {
    PathBuf::from(source_name)
}

/// Where a manip of a source is written, relative to the content root.
pub fn derived_file(source_name: &str, manip: &str, format: ImageFormat) -> PathBuf {
    content_dir(source_name).join(format!("{manip}.{}", format.extension()))
}

/// Where the exposed original of a source is linked, relative to the
/// content root.
pub fn original_link(source_name: &str, format: ImageFormat) -> PathBuf {
    derived_file(source_name, ORIGINAL, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_layout() {
        assert_eq!(derived_file("a-cat", "thumb", ImageFormat::Jpeg), Path::new("a-cat/thumb.jpeg"));
        assert_eq!(derived_file("a-cat", "thumb", ImageFormat::Png), Path::new("a-cat/thumb.png"));
        assert_eq!(original_link("a-dog", ImageFormat::Png), Path::new("a-dog/original.png"));
    }
}
