use crate::index::error::{Error, ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use futures::{StreamExt, TryStreamExt};
use kodak_catalog::models::{SourceRecord, name_from_path};
use kodak_manip::{ImageFormat, is_supported_extension};
use kodak_storage::{FileInfo, StorageBackend};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::instrument;

/// Files hashed at once while identifying.
const MAX_HASH_CONCURRENCY: usize = 8;

/// Walk the source tree and build unsaved records for every supported image
/// whose path is not in `known`.
///
/// A file whose name is already taken, by a cataloged source in `taken` or
/// by another file found in this walk, is skipped with a warning. The first
/// path in sort order wins among new files.
///
/// Files whose path is not valid UTF-8 can't be stored and are skipped
/// with a warning.
///
/// Records come back ordered by path.
#[instrument(skip_all, fields(backend = backend.name(), known = known.len()))]
pub async fn identify(
    backend: &dyn StorageBackend,
    known: &HashSet<PathBuf>,
    taken: &HashSet<String>,
) -> Result<Vec<SourceRecord>> {
    let mut candidates: Vec<(FileInfo, ImageFormat)> = Vec::new();
    let mut files = backend.list_stream(None);
    while let Some(file) = files.next().await {
        let file = file.or_raise(|| ErrorKind::Storage)?;
        let Some(extension) = file.extension().filter(|ext| is_supported_extension(ext)) else {
            tracing::debug!(path = %file.path.display(), "Skipping unsupported file");
            continue;
        };
        if known.contains(&file.path) {
            continue;
        }
        if file.path.to_str().is_none() {
            tracing::warn!(path = %file.path.display(), "Skipping file, its path is not valid UTF-8");
            continue;
        }
        // Both checks read the same format table, so this only fires if they
        // are ever split apart.
        let format = ImageFormat::from_extension(&extension).ok_or_raise(|| ErrorKind::Consistency(file.path.clone()))?;
        candidates.push((file, format));
    }
    candidates.sort_by(|(a, _), (b, _)| a.path.cmp(&b.path));

    let mut names = taken.clone();
    let mut accepted = Vec::with_capacity(candidates.len());
    for (file, format) in candidates {
        let name = name_from_path(&file.path);
        if !names.insert(name.clone()) {
            tracing::warn!(path = %file.path.display(), %name, "Skipping file, its name is already in use");
            continue;
        }
        accepted.push((file.path, format));
    }

    let mut records: Vec<SourceRecord> = futures::stream::iter(accepted)
        .map(|(path, format)| async move {
            let checksum = backend.checksum(&path).await.or_raise(|| ErrorKind::Storage)?;
            tracing::debug!(path = %path.display(), %format, "Identified new source");
            Ok::<_, Error>(SourceRecord::new(path, format, checksum))
        })
        .buffer_unordered(MAX_HASH_CONCURRENCY)
        .try_collect()
        .await?;
    records.sort_by(|a, b| a.source.cmp(&b.source));
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kodak_storage::Checksum;
    use kodak_storage::backend::LocalBackend;
    use tempfile::TempDir;

    fn tree(files: &[(&str, &[u8])]) -> (TempDir, LocalBackend) {
        let dir = tempfile::tempdir().unwrap();
        for (path, data) in files {
            let path = dir.path().join(path);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, data).unwrap();
        }
        let backend = LocalBackend::new("source", dir.path()).unwrap();
        (dir, backend)
    }

    #[tokio::test]
    async fn test_identifies_supported_files() {
        let (_dir, backend) = tree(&[
            ("a/cat.jpg", b"cat"),
            ("a/dog.PNG", b"dog"),
            ("b/notes.txt", b"notes"),
            ("README", b"readme"),
        ]);
        let records = identify(&backend, &HashSet::new(), &HashSet::new()).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source, PathBuf::from("a/cat.jpg"));
        assert_eq!(records[0].name, "a-cat");
        assert_eq!(records[0].format, ImageFormat::Jpeg);
        assert_eq!(records[0].checksum, Checksum::from_bytes(b"cat"));
        assert!(!records[0].deleted);
        assert_eq!(records[1].name, "a-dog");
        assert_eq!(records[1].format, ImageFormat::Png);
    }

    #[tokio::test]
    async fn test_skips_known_paths() {
        let (_dir, backend) = tree(&[("a/cat.jpg", b"cat"), ("a/dog.png", b"dog")]);
        let known = HashSet::from([PathBuf::from("a/cat.jpg")]);
        let records = identify(&backend, &known, &HashSet::from(["a-cat".to_string()])).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "a-dog");
    }

    #[tokio::test]
    async fn test_skips_name_collisions() {
        let (_dir, backend) = tree(&[("a/cat.jpg", b"jpeg"), ("a/cat.png", b"png"), ("b/owl.gif", b"gif")]);
        let taken = HashSet::from(["b-owl".to_string()]);
        let records = identify(&backend, &HashSet::new(), &taken).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, PathBuf::from("a/cat.jpg"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_skips_non_utf8_paths() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (dir, backend) = tree(&[("a/cat.jpg", b"cat")]);
        std::fs::write(dir.path().join(OsStr::from_bytes(b"b\xffd.jpg")), b"bad").unwrap();
        let records = identify(&backend, &HashSet::new(), &HashSet::new()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "a-cat");
    }

    #[tokio::test]
    async fn test_empty_tree() {
        let (_dir, backend) = tree(&[]);
        assert!(identify(&backend, &HashSet::new(), &HashSet::new()).await.unwrap().is_empty());
    }
}
