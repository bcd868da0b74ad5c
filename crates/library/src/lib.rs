//! Source catalog and derived-asset cache for kodak.
//!
//! The catalog mirrors a tree of original images into
//! [source records](kodak_catalog::models::SourceRecord), one per image,
//! addressed by a logical name derived from its path (`a/cat.jpg` becomes
//! `a-cat`). [`build_catalog`] converges the catalog on the tree and is
//! meant to be re-run whenever the tree may have changed.
//!
//! Request handlers then ask for an original by name with
//! [`resolve_original`], or for a manip of it with [`resolve_derived`],
//! which generates the manip on first request and serves the cataloged
//! file from then on.
//!
//! ```no_run
//! # async fn serve(config: &kodak_config::Config) -> kodak_library::error::Result<()> {
//! let ctx = kodak_library::Context::open(config).await?;
//! kodak_library::build_catalog(&ctx).await?;
//! let thumb = kodak_library::resolve_derived(&ctx, "holiday-beach", "thumb", "jpeg").await?;
//! let path = ctx.locate_derived(&thumb)?;
//! # Ok(())
//! # }
//! ```

mod context;
pub mod derived;
pub mod error;
pub mod index;
pub mod paths;
#[cfg(test)]
mod testing;

pub use crate::context::Context;
pub use crate::index::BuildReport;

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use kodak_catalog::SourceQuery;
use kodak_catalog::models::{DerivedRecord, SourceRecord};
use kodak_manip::ImageFormat;

/// Run one catalog pass. See [`index::build`].
pub async fn build_catalog(ctx: &Context) -> Result<BuildReport> {
    index::build(ctx).await.or_raise(|| ErrorKind::Index)
}

/// Look up the source record named `name`.
///
/// Fails with [`ErrorKind::Deleted`] when the only records by that name
/// are flagged deleted, and [`ErrorKind::NotFound`] when there are none.
pub async fn resolve_original(ctx: &Context, name: &str) -> Result<SourceRecord> {
    let records = ctx
        .repo
        .fetch_sources(&SourceQuery::new().name(name))
        .await
        .or_raise(|| ErrorKind::Catalog)?;
    if records.is_empty() {
        exn::bail!(ErrorKind::NotFound(name.to_string()));
    }
    // Newest first.
    records
        .into_iter()
        .find(|record| !record.deleted)
        .ok_or_raise(|| ErrorKind::Deleted(name.to_string()))
}

/// Look up, generating on first request, the manip `manip` of the source
/// named `name` encoded as `format`.
///
/// `format` is a format name or extension in any case (`jpeg`, `JPG`,
/// `png`). The manip and format are checked before anything is read.
pub async fn resolve_derived(ctx: &Context, name: &str, manip: &str, format: &str) -> Result<DerivedRecord> {
    let settings = ctx.manip(manip).ok_or_raise(|| ErrorKind::UnknownManip(manip.to_string()))?;
    let format = format.parse::<ImageFormat>().or_raise(|| ErrorKind::UnknownFormat(format.to_string()))?;
    if !settings.allows(format) {
        exn::bail!(ErrorKind::DisallowedFormat {
            manip: manip.to_string(),
            format: format.to_string(),
        });
    }
    let parent = resolve_original(ctx, name).await?;
    derived::resolve(ctx, &parent, settings, format).await.or_raise(|| ErrorKind::Derive)
}
