//! Read-only storage backend.
//!
//! Wraps another backend and prevents anything that would mutate the tree
//! from executing, while still indicating success on return. The source tree
//! is owned by the user; kodak only ever looks at it.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::backend::{BoxSyncRead, FileInfoStream};
use crate::{BackendHandle, StorageBackend, error::Result};

/// Read-only storage backend.
///
/// Silently drops all mutating operations, logging an
/// [`info event`](tracing::Event) for each.
#[derive(Clone)]
pub struct ReadOnlyBackend {
    inner: BackendHandle,
}
impl ReadOnlyBackend {
    pub fn new(inner: BackendHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl StorageBackend for ReadOnlyBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        self.inner.list_stream(prefix)
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        self.inner.exists(path).await
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.inner.read(path).await
    }

    async fn reader(&self, path: &Path) -> Result<BoxSyncRead> {
        self.inner.reader(path).await
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        tracing::info!(backend = %self.name(), path = %path.display(), bytes = data.len(), "Skipping write to read-only tree");
        Ok(())
    }

    async fn remove_dir(&self, path: &Path) -> Result<()> {
        tracing::info!(backend = %self.name(), path = %path.display(), "Skipping directory removal in read-only tree");
        Ok(())
    }

    fn locate(&self, path: &Path) -> Result<PathBuf> {
        self.inner.locate(path)
    }

    async fn link(&self, path: &Path, target: &Path) -> Result<()> {
        tracing::info!(backend = %self.name(), path = %path.display(), target = %target.display(), "Skipping link in read-only tree");
        Ok(())
    }

    async fn unlink(&self, path: &Path) -> Result<()> {
        tracing::info!(backend = %self.name(), path = %path.display(), "Skipping unlink in read-only tree");
        Ok(())
    }

    async fn checksum(&self, path: &Path) -> Result<crate::Checksum> {
        self.inner.checksum(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalBackend;
    use futures::TryStreamExt;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_mutations_are_dropped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let local = LocalBackend::new("source", temp_dir.path()).unwrap();
        local.write(Path::new("a/cat.jpg"), b"meow").await.unwrap();
        let backend = ReadOnlyBackend::new(Arc::new(local));

        backend.write(Path::new("a/dog.png"), b"woof").await.unwrap();
        backend.link(Path::new("a/owl.gif"), &temp_dir.path().join("a/cat.jpg")).await.unwrap();
        backend.remove_dir(Path::new("a")).await.unwrap();

        assert!(!backend.exists(Path::new("a/dog.png")).await.unwrap());
        assert_eq!(backend.read(Path::new("a/cat.jpg")).await.unwrap(), b"meow");
        assert!(!backend.exists(Path::new("a/owl.gif")).await.unwrap());
        let files: Vec<_> = backend.list_stream(None).try_collect().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(backend.locate(Path::new("a/cat.jpg")).unwrap(), temp_dir.path().join("a/cat.jpg"));
    }
}
