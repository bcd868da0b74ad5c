//! Derived-asset cache.
//!
//! A derived asset is a source image run through a [`Manip`] and encoded in
//! one output format. Each (source, manip, format) triple is generated at
//! most once: [`resolve`] returns the cataloged asset when there is one and
//! otherwise generates, writes and records it. Generation of a triple is
//! serialised within the process, and the record is only inserted once the
//! file is fully written.

pub mod error;

use crate::context::Context;
use crate::derived::error::{ErrorKind, Result};
use crate::paths;
use exn::ResultExt;
use kodak_catalog::models::{DerivedRecord, SourceRecord};
use kodak_manip::{ImageFormat, Manip};
use tracing::instrument;

/// Return the derived record for `parent` run through `manip` as `format`,
/// generating it on a miss.
///
/// The caller is expected to have checked that `manip` allows `format`.
#[instrument(skip_all, fields(source = %parent.name, manip = %manip.name, %format, hit))]
pub async fn resolve(ctx: &Context, parent: &SourceRecord, manip: &Manip, format: ImageFormat) -> Result<DerivedRecord> {
    let _guard = ctx.locks.lock((parent.meta.id, manip.name.clone(), format)).await;

    let cached = ctx
        .repo
        .latest_derived(parent.meta.id, &manip.name, format)
        .await
        .or_raise(|| ErrorKind::Catalog)?;
    tracing::Span::current().record("hit", cached.is_some());
    if let Some(record) = cached {
        return Ok(record);
    }

    let original = ctx.source.read(&parent.source).await.or_raise(|| ErrorKind::Storage)?;
    let settings = manip.clone();
    let encoded = tokio::task::spawn_blocking(move || {
        let image = kodak_manip::decode(&original)?;
        let image = kodak_manip::apply(image, &settings);
        kodak_manip::encode(&image, format)
    })
    .await
    .or_raise(|| ErrorKind::Task)?
    .or_raise(|| ErrorKind::Manip)?;

    let file = paths::derived_file(&parent.name, &manip.name, format);
    ctx.content.write(&file, &encoded).await.or_raise(|| ErrorKind::Storage)?;
    let checksum = ctx.content.checksum(&file).await.or_raise(|| ErrorKind::Storage)?;

    let record = DerivedRecord::new(parent.meta.id, manip.name.as_str(), file, format, checksum);
    let (record, created) = ctx.repo.get_or_create_derived(record).await.or_raise(|| ErrorKind::Catalog)?;
    if created {
        tracing::info!(id = %record.meta.id, file = %record.file.display(), bytes = encoded.len(), "Generated derived image");
    } else {
        tracing::warn!(id = %record.meta.id, "Derived image was recorded by another writer");
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use kodak_manip::ScaleConfig;
    use kodak_storage::Checksum;

    #[tokio::test]
    async fn test_miss_then_hit() {
        let dirs = testing::Dirs::new();
        dirs.image("cat.png", 64, 32, image::ImageFormat::Png);
        let ctx = testing::context(&dirs, Vec::new(), false).await;
        let parent = SourceRecord::new("cat.png", ImageFormat::Png, Checksum::from_bytes(b"unused"));
        ctx.repo.create_source(&parent).await.unwrap();

        let mut manip = Manip::new("half");
        manip.scale = ScaleConfig {
            horizontal: Some(32.0),
            ..Default::default()
        };
        let first = resolve(&ctx, &parent, &manip, ImageFormat::Png).await.unwrap();
        assert_eq!(first.file, std::path::Path::new("cat/half.png"));
        let written = std::fs::read(dirs.content().join(&first.file)).unwrap();
        assert_eq!(first.checksum, Checksum::from_bytes(&written));
        let generated = image::load_from_memory(&written).unwrap();
        assert_eq!((generated.width(), generated.height()), (32, 16));

        // A hit never touches the original.
        std::fs::remove_file(dirs.source().join("cat.png")).unwrap();
        let second = resolve(&ctx, &parent, &manip, ImageFormat::Png).await.unwrap();
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_undecodable_original() {
        let dirs = testing::Dirs::new();
        std::fs::write(dirs.source().join("broken.jpg"), b"not a jpeg").unwrap();
        let ctx = testing::context(&dirs, Vec::new(), false).await;
        let parent = SourceRecord::new("broken.jpg", ImageFormat::Jpeg, Checksum::from_bytes(b"not a jpeg"));
        ctx.repo.create_source(&parent).await.unwrap();

        let err = resolve(&ctx, &parent, &Manip::new("thumb"), ImageFormat::Jpeg).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Manip);
        assert!(ctx.repo.latest_derived(parent.meta.id, "thumb", ImageFormat::Jpeg).await.unwrap().is_none());
        assert!(!dirs.content().join("broken").exists());
    }
}
