//! Catalog records and their database rows.
//!
//! Records are the public models handed to and returned from the
//! [`Repository`](crate::Repository). Rows are their flat, storable form;
//! every conversion between the two validates enum names, identifiers and
//! checksums rather than defaulting.

mod access;
mod derived;
mod source;

pub use self::access::AccessRecord;
pub(crate) use self::access::AccessRow;
pub use self::derived::DerivedRecord;
pub(crate) use self::derived::DerivedRow;
pub use self::source::{NAME_SEPARATOR, SourceField, SourceRecord, name_from_path};
pub(crate) use self::source::SourceRow;

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use kodak_manip::ImageFormat;
use kodak_storage::Checksum;
use std::path::Path;
use time::UtcDateTime;
use uuid::Uuid;

/// Identity shared by every record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordMeta {
    pub id: Uuid,
    pub created: UtcDateTime,
}
impl RecordMeta {
    /// Fresh identity for an unsaved record.
    pub fn new() -> Self {
        // Stored with second precision; truncate now so that a record reads
        // back equal to the value that was written.
        let now = UtcDateTime::now();
        Self {
            id: Uuid::new_v4(),
            created: now.replace_nanosecond(0).unwrap_or(now),
        }
    }

    pub(crate) fn from_row(id: &str, created: i64) -> Result<Self> {
        Ok(Self {
            id: Uuid::parse_str(id).or_raise(|| ErrorKind::InvalidData("record id"))?,
            created: UtcDateTime::from_unix_timestamp(created).or_raise(|| ErrorKind::InvalidData("creation date"))?,
        })
    }
}
impl Default for RecordMeta {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn sqlx_hates_paths(path: impl AsRef<Path>) -> Result<String> {
    Ok(path.as_ref().to_str().ok_or_raise(|| ErrorKind::InvalidData("path"))?.to_string())
}

fn parse_format(name: &str) -> Result<ImageFormat> {
    let format = name.parse::<ImageFormat>().or_raise(|| ErrorKind::InvalidData("image format"))?;
    // Only canonical names are ever written.
    if format.as_name() != name {
        exn::bail!(ErrorKind::InvalidData("image format"));
    }
    Ok(format)
}

fn parse_checksum(value: &str) -> Result<Checksum> {
    value.parse::<Checksum>().or_raise(|| ErrorKind::InvalidData("checksum"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("JPEG", ImageFormat::Jpeg)]
    #[case("PNG", ImageFormat::Png)]
    #[case("GIF", ImageFormat::Gif)]
    fn test_parse_format(#[case] name: &str, #[case] expected: ImageFormat) {
        assert_eq!(parse_format(name).unwrap(), expected);
    }

    #[rstest]
    #[case("jpeg")]
    #[case("jpg")]
    #[case("WEBP")]
    #[case("")]
    fn test_parse_format_rejects_non_canonical(#[case] name: &str) {
        let err = parse_format(name).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidData("image format"));
    }

    #[test]
    fn test_meta_round_trips_through_row() {
        let meta = RecordMeta::new();
        let read = RecordMeta::from_row(&meta.id.to_string(), meta.created.unix_timestamp()).unwrap();
        assert_eq!(read, meta);
        assert!(RecordMeta::from_row("not-a-uuid", 0).is_err());
    }
}
