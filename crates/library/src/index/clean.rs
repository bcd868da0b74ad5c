use crate::index::error::{ErrorKind, Result};
use exn::ResultExt;
use kodak_catalog::models::SourceRecord;
use kodak_storage::StorageBackend;
use tracing::instrument;

/// Flag every record whose file has disappeared from the source tree.
///
/// Records already flagged are ignored. Only the returned copies are
/// changed; persisting them is up to the caller.
#[instrument(skip_all, fields(backend = backend.name(), records = existing.len()))]
pub async fn clean(backend: &dyn StorageBackend, existing: &[SourceRecord]) -> Result<Vec<SourceRecord>> {
    let mut stale = Vec::new();
    for record in existing.iter().filter(|record| !record.deleted) {
        if backend.exists(&record.source).await.or_raise(|| ErrorKind::Storage)? {
            continue;
        }
        tracing::debug!(name = %record.name, path = %record.source.display(), "Source file is gone");
        let mut record = record.clone();
        record.deleted = true;
        stale.push(record);
    }
    Ok(stale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kodak_manip::ImageFormat;
    use kodak_storage::Checksum;
    use kodak_storage::backend::LocalBackend;

    #[tokio::test]
    async fn test_flags_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cat.jpg"), b"cat").unwrap();
        let backend = LocalBackend::new("source", dir.path()).unwrap();

        let present = SourceRecord::new("cat.jpg", ImageFormat::Jpeg, Checksum::from_bytes(b"cat"));
        let missing = SourceRecord::new("dog.png", ImageFormat::Png, Checksum::from_bytes(b"dog"));
        let mut flagged = SourceRecord::new("owl.gif", ImageFormat::Gif, Checksum::from_bytes(b"owl"));
        flagged.deleted = true;

        let stale = clean(&backend, &[present, missing.clone(), flagged]).await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].meta, missing.meta);
        assert!(stale[0].deleted);
        assert_eq!(stale[0].checksum, missing.checksum);
    }
}
