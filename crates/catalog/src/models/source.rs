use super::{RecordMeta, parse_checksum, parse_format, sqlx_hates_paths};
use crate::error::{Error, ErrorKind};
use kodak_manip::ImageFormat;
use kodak_storage::Checksum;
use std::path::{Component, Path, PathBuf};

/// Joins path segments when deriving a source's name from its path.
pub const NAME_SEPARATOR: &str = "-";

/// Logical name of a source file: its path relative to the source root,
/// without extension, with path separators replaced.
///
/// ```
/// use kodak_catalog::models::name_from_path;
/// assert_eq!(name_from_path("a/cat.jpg"), "a-cat");
/// assert_eq!(name_from_path("holiday/2024/beach.png"), "holiday-2024-beach");
/// ```
pub fn name_from_path(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    let stem = path.with_extension("");
    stem.components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR)
}

/// Catalog entry for an original image in the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub meta: RecordMeta,
    /// Logical name, see [`name_from_path`].
    pub name: String,
    /// Path relative to the source root.
    pub source: PathBuf,
    pub format: ImageFormat,
    pub deleted: bool,
    pub checksum: Checksum,
}
impl SourceRecord {
    /// Build an unsaved record for a file at `source` (relative to the
    /// source root).
    pub fn new(source: impl Into<PathBuf>, format: ImageFormat, checksum: Checksum) -> Self {
        let source = source.into();
        Self {
            meta: RecordMeta::new(),
            name: name_from_path(&source),
            source,
            format,
            deleted: false,
            checksum,
        }
    }
}

/// Columns of [`SourceRecord`] that bulk updates may rewrite.
///
/// Updates only ever touch the listed fields so that a pass flipping
/// `deleted` can't clobber concurrent changes to anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceField {
    Name,
    Source,
    Format,
    Deleted,
    Checksum,
}
impl SourceField {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Source => "source",
            Self::Format => "format",
            Self::Deleted => "deleted",
            Self::Checksum => "checksum",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct SourceRow {
    pub id: String,
    pub created: i64,
    pub name: String,
    pub source: String,
    pub format: String,
    pub deleted: bool,
    pub checksum: String,
}
impl SourceRow {
    /// Number of bound columns in an insert.
    pub const FIELDS: usize = 7;
}
impl TryFrom<&SourceRecord> for SourceRow {
    type Error = Error;
    fn try_from(record: &SourceRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.meta.id.to_string(),
            created: record.meta.created.unix_timestamp(),
            name: record.name.clone(),
            source: sqlx_hates_paths(&record.source)?,
            format: record.format.as_name().to_string(),
            deleted: record.deleted,
            checksum: record.checksum.to_string(),
        })
    }
}
impl TryFrom<SourceRow> for SourceRecord {
    type Error = Error;
    fn try_from(row: SourceRow) -> Result<Self, Self::Error> {
        if row.name.is_empty() {
            exn::bail!(ErrorKind::InvalidData("source name"));
        }
        Ok(Self {
            meta: RecordMeta::from_row(&row.id, row.created)?,
            name: row.name,
            source: PathBuf::from(row.source),
            format: parse_format(&row.format)?,
            deleted: row.deleted,
            checksum: parse_checksum(&row.checksum)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("cat.jpg", "cat")]
    #[case("a/cat.jpg", "a-cat")]
    #[case("a/b/c/dog.png", "a-b-c-dog")]
    #[case("a/archive.tar.gif", "a-archive.tar")]
    #[case("no-extension", "no-extension")]
    fn test_name_from_path(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(name_from_path(path), expected);
    }

    #[test]
    fn test_new_record() {
        let record = SourceRecord::new("a/cat.jpg", ImageFormat::Jpeg, Checksum::from_bytes(b"meow"));
        assert_eq!(record.name, "a-cat");
        assert!(!record.deleted);
    }

    #[test]
    fn test_record_round_trips_through_row() {
        let record = SourceRecord::new("a/dog.png", ImageFormat::Png, Checksum::from_bytes(b"woof"));
        let row = SourceRow::try_from(&record).unwrap();
        assert_eq!(row.format, "PNG");
        assert_eq!(row.source, "a/dog.png");
        assert_eq!(SourceRecord::try_from(row).unwrap(), record);
    }

    #[test]
    fn test_unknown_stored_format() {
        let record = SourceRecord::new("a/dog.png", ImageFormat::Png, Checksum::from_bytes(b"woof"));
        let mut row = SourceRow::try_from(&record).unwrap();
        row.format = "TIFF".to_string();
        let err = SourceRecord::try_from(row).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidData("image format"));
    }

    #[test]
    fn test_malformed_stored_checksum() {
        let record = SourceRecord::new("a/dog.png", ImageFormat::Png, Checksum::from_bytes(b"woof"));
        let mut row = SourceRow::try_from(&record).unwrap();
        row.checksum = "garbage".to_string();
        let err = SourceRecord::try_from(row).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidData("checksum"));
    }
}
