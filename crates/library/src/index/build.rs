use crate::context::Context;
use crate::index::error::{ErrorKind, Result};
use crate::index::{clean, identify};
use crate::paths;
use exn::ResultExt;
use kodak_catalog::SourceQuery;
use kodak_catalog::models::{SourceField, SourceRecord};
use kodak_storage::error::ErrorKind as StorageErrorKind;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::instrument;

/// What a catalog pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Source records inserted for newly found files.
    pub created: usize,
    /// Source records flagged deleted because their file disappeared.
    pub deleted: usize,
    /// Exposed-original links created in the content tree.
    pub links_created: usize,
    /// Exposed-original links removed from the content tree.
    pub links_removed: usize,
}
impl BuildReport {
    /// `true` if the pass found the catalog already in sync.
    pub fn is_unchanged(&self) -> bool {
        *self == Self::default()
    }
}

/// Run one full catalog pass.
///
/// 1. Sources whose file is gone are flagged deleted (only the `deleted`
///    column is rewritten) and their content directory is removed.
/// 2. New files are identified and inserted. A name freed in step 1 can be
///    taken by a new file in the same pass.
/// 3. Every remaining source gets its exposed-original link created or
///    removed, depending on configuration.
///
/// Each step that writes the catalog is a single transaction. Running the
/// pass again straight away changes nothing.
#[instrument(skip_all, fields(expose_source = ctx.expose_source))]
pub async fn build(ctx: &Context) -> Result<BuildReport> {
    let mut report = BuildReport::default();
    let existing = ctx
        .repo
        .fetch_sources(&SourceQuery::new().deleted(false))
        .await
        .or_raise(|| ErrorKind::Catalog)?;

    // Names held by sources whose file is gone are free again in this pass,
    // so a file renamed to another extension keeps its name.
    let stale = clean(ctx.source.as_ref(), &existing).await?;
    let stale_ids: HashSet<_> = stale.iter().map(|record| record.meta.id).collect();
    let live: Vec<&SourceRecord> = existing
        .iter()
        .filter(|record| !stale_ids.contains(&record.meta.id))
        .collect();

    let known: HashSet<PathBuf> = live.iter().map(|record| record.source.clone()).collect();
    let taken: HashSet<String> = live.iter().map(|record| record.name.clone()).collect();
    let created = identify(ctx.source.as_ref(), &known, &taken).await?;

    report.deleted = ctx
        .repo
        .update_sources(&stale, &[SourceField::Deleted])
        .await
        .or_raise(|| ErrorKind::Catalog)?;
    report.created = ctx.repo.create_sources(&created).await.or_raise(|| ErrorKind::Catalog)?;
    for record in &stale {
        remove_content(ctx, record).await?;
    }

    for record in live.into_iter().chain(&created) {
        if ctx.expose_source {
            report.links_created += usize::from(expose(ctx, record).await?);
        } else {
            report.links_removed += usize::from(conceal(ctx, record).await?);
        }
    }

    tracing::info!(
        created = report.created,
        deleted = report.deleted,
        links_created = report.links_created,
        links_removed = report.links_removed,
        "Catalog pass complete"
    );
    Ok(report)
}

async fn remove_content(ctx: &Context, record: &SourceRecord) -> Result<()> {
    match ctx.content.remove_dir(&paths::content_dir(&record.name)).await {
        Ok(()) => {
            tracing::debug!(name = %record.name, "Removed generated content");
            Ok(())
        },
        Err(err) if matches!(&*err, StorageErrorKind::NotFound(_)) => Ok(()),
        Err(err) => Err(err).or_raise(|| ErrorKind::Storage),
    }
}

/// Link the original into the content tree. Returns `false` if something
/// already occupies the link path.
async fn expose(ctx: &Context, record: &SourceRecord) -> Result<bool> {
    let link = paths::original_link(&record.name, record.format);
    let target = ctx.source.locate(&record.source).or_raise(|| ErrorKind::Storage)?;
    match ctx.content.link(&link, &target).await {
        Ok(()) => {
            tracing::debug!(link = %link.display(), target = %target.display(), "Exposed original");
            Ok(true)
        },
        Err(err) if matches!(&*err, StorageErrorKind::AlreadyExists(_)) => Ok(false),
        Err(err) => Err(err).or_raise(|| ErrorKind::Storage),
    }
}

/// Remove the original's link from the content tree. Returns `false` if
/// there was no link.
async fn conceal(ctx: &Context, record: &SourceRecord) -> Result<bool> {
    let link = paths::original_link(&record.name, record.format);
    match ctx.content.unlink(&link).await {
        Ok(()) => {
            tracing::debug!(link = %link.display(), "Concealed original");
            Ok(true)
        },
        Err(err) if matches!(&*err, StorageErrorKind::NotFound(_)) => Ok(false),
        Err(err) if matches!(&*err, StorageErrorKind::InvalidPath(_)) => {
            tracing::warn!(link = %link.display(), "Not a link, leaving it in place");
            Ok(false)
        },
        Err(err) => Err(err).or_raise(|| ErrorKind::Storage),
    }
}
