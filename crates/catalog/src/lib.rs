//! SQLite record store for the kodak catalog.
//!
//! Three record kinds are persisted, one table each:
//! - **Sources**: original images discovered in the source tree. Never
//!   physically removed; a source whose file disappears is flagged deleted
//!   and kept for history.
//! - **Derived**: generated manips of a source, one per (source, manip,
//!   format). Never updated in place.
//! - **Access**: opaque credentials for the HTTP layer.
//!
//! Callers only construct unsaved records; the [`Repository`] owns every
//! write, its transaction and its batching.

mod batch;
mod db;
pub mod error;
pub mod models;
mod query;
mod repo;

pub use crate::batch::{SQLITE_VARIABLE_LIMIT, calc_batch_size};
pub use crate::db::Database;
pub use crate::query::{DerivedQuery, SourceQuery};
pub use crate::repo::Repository;
