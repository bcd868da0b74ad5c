//! Storage backends and content addressing for kodak.
//!
//! Two trees are accessed through [`StorageBackend`]s: the source tree
//! (original images, treated as read-only) and the content tree (generated
//! manips and exposed-source links). Every stored asset is addressed by a
//! [`Checksum`].

pub mod backend;
mod checksum;
pub mod error;
pub mod file;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::checksum::{CHUNK_SIZE, Checksum, DEFAULT_ALGORITHM};
pub use crate::file::FileInfo;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
