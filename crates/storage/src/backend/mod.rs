//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, a unified interface over
//! the two trees kodak works with: the source tree of original images and
//! the content tree of generated assets.

mod local;
mod ro;

pub use self::local::LocalBackend;
pub use self::ro::ReadOnlyBackend;
use crate::Checksum;
use crate::error::{ErrorKind, Result};
use crate::file::FileInfo;
use async_trait::async_trait;
use exn::ResultExt;
use futures::Stream;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::pin::Pin;

pub(crate) type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;
pub(crate) type BoxSyncRead = Box<dyn Read + Send + 'static>;

/// Unified interface for storage trees.
///
/// # Path Handling
/// All paths are relative to the storage root and are validated using
/// [`validate_path`](crate::validate_path) before use. Implementations must
/// enforce this validation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use kodak_storage::{StorageBackend, error::Result};
///
/// async fn size_of_original(backend: &dyn StorageBackend) -> Result<u64> {
///     let path = Path::new("holiday/beach.jpg");
///     if backend.exists(path).await? {
///         Ok(backend.read(path).await?.len() as u64)
///     } else {
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the backend, used for logging only.
    fn name(&self) -> &str;

    /// Stream every regular file under the root (or under
    /// `prefix`), descending into directories. Anything that is neither a
    /// file nor a directory is skipped.
    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a>;

    /// Check if a file exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read the complete file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Open a file for streaming reads.
    ///
    /// Returns a `'static` boxed [`Read`] suitable for use inside
    /// [`spawn_blocking`](tokio::task::spawn_blocking).
    async fn reader(&self, path: &Path) -> Result<BoxSyncRead>;

    /// Write file contents, creating parent directories as needed.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Recursively delete a directory and everything below it.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the
    /// directory does not exist.
    async fn remove_dir(&self, path: &Path) -> Result<()>;

    /// Resolve a storage path to its absolute location on the filesystem.
    fn locate(&self, path: &Path) -> Result<PathBuf>;

    /// Create a symbolic link at `path` pointing to the absolute `target`.
    ///
    /// Returns [`AlreadyExists`](crate::error::ErrorKind::AlreadyExists) if
    /// something already occupies `path`.
    async fn link(&self, path: &Path, target: &Path) -> Result<()>;

    /// Remove the symbolic link at `path`.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if there is
    /// no link at `path`. Regular files are never removed by this method.
    async fn unlink(&self, path: &Path) -> Result<()>;

    /// Stream a file through [`Checksum::from_reader`] on a blocking thread.
    async fn checksum(&self, path: &Path) -> Result<Checksum> {
        let reader = self.reader(path).await?;
        tokio::task::spawn_blocking(move || Checksum::from_reader(reader))
            .await
            .or_raise(|| ErrorKind::BackendError("checksum task panicked".to_string()))?
    }
}
