//! Scratch trees and contexts shared by the tests in this crate.

use crate::context::Context;
use image::{DynamicImage, Rgb, RgbImage};
use kodak_catalog::{Database, Repository, SQLITE_VARIABLE_LIMIT};
use kodak_config::Config;
use kodak_manip::Manip;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A source tree and a content tree in one temporary directory.
pub(crate) struct Dirs {
    root: TempDir,
}
impl Dirs {
    pub(crate) fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("source")).unwrap();
        Self { root }
    }

    pub(crate) fn root(&self) -> &Path {
        self.root.path()
    }

    pub(crate) fn source(&self) -> PathBuf {
        self.root.path().join("source")
    }

    pub(crate) fn content(&self) -> PathBuf {
        self.root.path().join("content")
    }

    /// Write a gradient image to `path` under the source tree.
    pub(crate) fn image(&self, path: &str, width: u32, height: u32, format: image::ImageFormat) {
        let path = self.source().join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let image = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        DynamicImage::ImageRgb8(image).save_with_format(path, format).unwrap();
    }

    pub(crate) fn config(&self, manips: Vec<Manip>, expose_source: bool) -> Config {
        Config {
            source_dir: self.source(),
            content_dir: self.content(),
            expose_source,
            manips: manips.into_iter().map(|manip| (manip.name.clone(), manip)).collect(),
            ..Default::default()
        }
    }
}

/// Context over `dirs` backed by an in-memory catalog.
pub(crate) async fn context(dirs: &Dirs, manips: Vec<Manip>, expose_source: bool) -> Context {
    let db = Database::connect_in_memory().await.unwrap();
    let repo = Repository::new(db.pool().clone(), Some(SQLITE_VARIABLE_LIMIT));
    Context::new(&dirs.config(manips, expose_source), repo).unwrap()
}
