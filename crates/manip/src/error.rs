//! Manip Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A manip error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for manip operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source bytes are not a decodable image. Don't retry with the same input.
    #[display("image could not be decoded")]
    Decode,
    /// The transformed image could not be written in the requested format.
    #[display("image could not be encoded as {_0}")]
    Encode(#[error(not(source))] String),
    /// A manip's settings are out of range or contradictory.
    #[display("invalid manip settings: {_0}")]
    InvalidSettings(#[error(not(source))] String),
    /// The named format is not in the format table.
    #[display("unknown image format: {_0}")]
    UnknownFormat(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Decode.to_string(), "image could not be decoded");
        assert_eq!(
            ErrorKind::UnknownFormat("webp".to_string()).to_string(),
            "unknown image format: webp"
        );
    }
}
