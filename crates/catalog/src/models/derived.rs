use super::{RecordMeta, parse_checksum, parse_format, sqlx_hates_paths};
use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use kodak_manip::ImageFormat;
use kodak_storage::Checksum;
use std::path::PathBuf;
use uuid::Uuid;

/// Catalog entry for a generated manip of a source image.
///
/// Never updated in place: regenerating a manip means inserting a
/// replacement, and lookups return the latest row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedRecord {
    pub meta: RecordMeta,
    /// Id of the [`SourceRecord`](crate::models::SourceRecord) this was
    /// generated from.
    pub parent: Uuid,
    /// Name of the manip that produced it.
    pub name: String,
    /// Path relative to the content root.
    pub file: PathBuf,
    pub format: ImageFormat,
    pub checksum: Checksum,
}
impl DerivedRecord {
    pub fn new(
        parent: Uuid,
        name: impl Into<String>,
        file: impl Into<PathBuf>,
        format: ImageFormat,
        checksum: Checksum,
    ) -> Self {
        Self {
            meta: RecordMeta::new(),
            parent,
            name: name.into(),
            file: file.into(),
            format,
            checksum,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct DerivedRow {
    pub id: String,
    pub created: i64,
    pub parent: String,
    pub name: String,
    pub file: String,
    pub format: String,
    pub checksum: String,
}
impl TryFrom<&DerivedRecord> for DerivedRow {
    type Error = Error;
    fn try_from(record: &DerivedRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.meta.id.to_string(),
            created: record.meta.created.unix_timestamp(),
            parent: record.parent.to_string(),
            name: record.name.clone(),
            file: sqlx_hates_paths(&record.file)?,
            format: record.format.as_name().to_string(),
            checksum: record.checksum.to_string(),
        })
    }
}
impl TryFrom<DerivedRow> for DerivedRecord {
    type Error = Error;
    fn try_from(row: DerivedRow) -> Result<Self, Self::Error> {
        Ok(Self {
            meta: RecordMeta::from_row(&row.id, row.created)?,
            parent: Uuid::parse_str(&row.parent).or_raise(|| ErrorKind::InvalidData("parent id"))?,
            name: row.name,
            file: PathBuf::from(row.file),
            format: parse_format(&row.format)?,
            checksum: parse_checksum(&row.checksum)?,
        })
    }
}
