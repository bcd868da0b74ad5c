//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Failures inside a catalog pass or a
//! derived resolution are raised from their module's own error kinds.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong, from the point of view of the HTTP layer.
///
/// ### Client Errors
/// - [`ErrorKind::NotFound`]
/// - [`ErrorKind::Deleted`]
/// - [`ErrorKind::UnknownManip`]
/// - [`ErrorKind::UnknownFormat`]
/// - [`ErrorKind::DisallowedFormat`]
///
/// ### Server Errors
/// Everything else.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No source record goes by this name.
    #[display("no image named `{_0}`")]
    NotFound(#[error(not(source))] String),
    /// Every source record with this name has been flagged deleted.
    #[display("image `{_0}` has been deleted")]
    Deleted(#[error(not(source))] String),
    #[display("no manip named `{_0}`")]
    UnknownManip(#[error(not(source))] String),
    #[display("unknown image format `{_0}`")]
    UnknownFormat(#[error(not(source))] String),
    /// The format exists but the manip doesn't allow it.
    #[display("manip `{manip}` is not available as {format}")]
    DisallowedFormat { manip: String, format: String },
    /// Configuration couldn't be turned into a working context.
    #[display("invalid library configuration")]
    Config,
    /// The catalog database failed outside of a pass.
    #[display("catalog error")]
    Catalog,
    /// A catalog pass failed; see the [`index`](crate::index) error beneath.
    #[display("catalog pass failed")]
    Index,
    /// Generating or looking up a manip failed; see the
    /// [`derived`](crate::derived) error beneath.
    #[display("derived image could not be resolved")]
    Derive,
}

impl ErrorKind {
    /// Returns `true` if the caller asked for something that doesn't exist
    /// or isn't allowed, rather than the library failing.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::Deleted(_)
                | Self::UnknownManip(_)
                | Self::UnknownFormat(_)
                | Self::DisallowedFormat { .. }
        )
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A source file can vanish between a lookup and the read; a catalog
        // pass will flag it, after which the retry is answered properly.
        matches!(self, Self::Index | Self::Derive | Self::Catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(ErrorKind::NotFound("a-cat".to_string()).is_client_error());
        assert!(
            ErrorKind::DisallowedFormat {
                manip: "thumb".to_string(),
                format: "GIF".to_string()
            }
            .is_client_error()
        );
        assert!(!ErrorKind::Derive.is_client_error());
        assert!(!ErrorKind::UnknownManip("x".to_string()).is_retryable());
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorKind::Deleted("a-dog".to_string()).to_string(), "image `a-dog` has been deleted");
        assert_eq!(
            ErrorKind::DisallowedFormat {
                manip: "thumb".to_string(),
                format: "GIF".to_string()
            }
            .to_string(),
            "manip `thumb` is not available as GIF"
        );
    }
}
