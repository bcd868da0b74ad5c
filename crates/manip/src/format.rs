//! The image format table.
//!
//! Every supported format has a canonical stored name (upper-case, e.g.
//! `JPEG`), a canonical output extension (lower-case name, e.g. `jpeg`) and
//! the list of file extensions it is recognised by in the source tree.

use crate::error::{Error, ErrorKind};
use serde::de::{Deserialize, Deserializer, Error as DeError};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::str::FromStr;

/// A supported image format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
}
impl ImageFormat {
    pub const ALL: [ImageFormat; 3] = [Self::Jpeg, Self::Png, Self::Gif];

    /// Canonical name, used when persisting a format.
    pub fn as_name(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Gif => "GIF",
        }
    }

    /// Extension used for generated files.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }

    /// Every file extension (lower-case, without the dot) that identifies
    /// this format in the source tree.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Jpeg => &["jpg", "jpeg"],
            Self::Png => &["png"],
            Self::Gif => &["gif"],
        }
    }

    /// Look up a format by file extension, case-insensitively.
    ///
    /// ```
    /// use kodak_manip::ImageFormat;
    /// assert_eq!(ImageFormat::from_extension("JPG"), Some(ImageFormat::Jpeg));
    /// assert_eq!(ImageFormat::from_extension("webp"), None);
    /// ```
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.to_ascii_lowercase();
        Self::ALL.into_iter().find(|format| format.extensions().contains(&extension.as_str()))
    }

    /// Look up the format of a file by its path's extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub(crate) fn as_image_format(&self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::Gif => image::ImageFormat::Gif,
        }
    }
}

/// Whether a file extension belongs to any format in the table.
pub fn is_supported_extension(extension: &str) -> bool {
    ImageFormat::from_extension(extension).is_some()
}

impl Display for ImageFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_name())
    }
}
impl FromStr for ImageFormat {
    type Err = Error;
    /// Accepts canonical names and extensions in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from_extension(s.trim()) {
            Some(format) => Ok(format),
            None => exn::bail!(ErrorKind::UnknownFormat(s.to_string())),
        }
    }
}
impl<'de> Deserialize<'de> for ImageFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(|_| D::Error::custom(format!("unknown image format: {value}")))
    }
}
