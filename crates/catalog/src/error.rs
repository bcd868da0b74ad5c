//! Catalog Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A statement or transaction failed and was rolled back.
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// A stored value can't be mapped back to its model, or a model value
    /// can't be stored. Indicates drift between code and data; never
    /// defaulted away.
    #[display("invalid catalog data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    /// The backend's bound-parameter limit can't fit even a single record.
    #[display("parameter limit of {_0} is too small for one record")]
    ParameterLimit(#[error(not(source))] usize),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Lock contention surfaces as a plain database error.
        matches!(self, Self::Database)
    }
}
