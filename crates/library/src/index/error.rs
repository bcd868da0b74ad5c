//! Error types for the [`index`](super) module.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An index error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog passes.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a catalog pass failure.
///
/// ### Operational Errors
/// - [`ErrorKind::Consistency`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Catalog`]
/// - [`ErrorKind::Storage`]
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A record read or write via [`kodak_catalog::Repository`] failed.
    Catalog,
    /// Listing, hashing or linking in a storage tree failed.
    Storage,
    /// A file has a supported extension but no format claims it. The
    /// extension list and the format table have drifted apart.
    #[display("no image format for supported file {}", _0.display())]
    Consistency(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage | Self::Catalog)
    }
}
