//! Error types for the [`derived`](super) module.

use derive_more::{Display, Error};

/// A derived-cache error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for derived-cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a failed resolution.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Looking up or persisting a [`DerivedRecord`](kodak_catalog::models::DerivedRecord) failed.
    Catalog,
    /// Reading the original or writing the generated file failed.
    Storage,
    /// The original couldn't be decoded, transformed or re-encoded.
    Manip,
    /// The blocking image task panicked or was cancelled.
    Task,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Catalog | Self::Storage)
    }
}
