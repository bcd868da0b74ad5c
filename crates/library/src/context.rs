//! Everything a catalog pass or a derived resolution needs, wired up once
//! from configuration and passed around explicitly.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use kodak_catalog::models::{DerivedRecord, SourceRecord};
use kodak_catalog::{Database, Repository};
use kodak_config::Config;
use kodak_manip::{ImageFormat, Manip};
use kodak_storage::backend::{LocalBackend, ReadOnlyBackend};
use kodak_storage::BackendHandle;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Identifies one derived asset: source id, manip name and output format.
pub(crate) type DerivedKey = (Uuid, String, ImageFormat);

/// One async mutex per key, created on demand and dropped once nobody
/// holds or waits on it.
#[derive(Debug, Default)]
pub(crate) struct KeyedLocks {
    locks: Mutex<HashMap<DerivedKey, Arc<AsyncMutex<()>>>>,
}
impl KeyedLocks {
    pub(crate) async fn lock(&self, key: DerivedKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Only the map itself still references idle locks.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(key).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Shared state for the catalog and the derived cache.
///
/// Cheap to share behind an [`Arc`]; every method takes `&self`.
pub struct Context {
    pub(crate) repo: Repository,
    /// Read-only view of the tree of originals.
    pub(crate) source: BackendHandle,
    /// Generated manips and exposed originals.
    pub(crate) content: BackendHandle,
    pub(crate) expose_source: bool,
    pub(crate) manips: BTreeMap<String, Manip>,
    pub(crate) locks: KeyedLocks,
}

impl Context {
    /// Wire up storage backends from `config` around an existing repository.
    ///
    /// The source directory must already exist; the content directory is
    /// created if missing.
    pub fn new(config: &Config, repo: Repository) -> Result<Self> {
        if !config.source_dir.is_dir() {
            tracing::error!(path = %config.source_dir.display(), "Source directory does not exist");
            exn::bail!(ErrorKind::Config);
        }
        let source = LocalBackend::new("source", &config.source_dir).or_raise(|| ErrorKind::Config)?;
        let content = LocalBackend::new("content", &config.content_dir).or_raise(|| ErrorKind::Config)?;
        Ok(Self {
            repo,
            source: Arc::new(ReadOnlyBackend::new(Arc::new(source))),
            content: Arc::new(content),
            expose_source: config.expose_source,
            manips: config.manips.clone(),
            locks: KeyedLocks::default(),
        })
    }

    /// Connect to the configured catalog database (creating it and its
    /// directory if needed) and wire up storage backends.
    pub async fn open(config: &Config) -> Result<Self> {
        if let Some(parent) = config.database.path.parent() {
            tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Config)?;
        }
        let db = Database::connect(&config.database.path, config.database.max_connections)
            .await
            .or_raise(|| ErrorKind::Catalog)?;
        let repo = Repository::new(db.pool().clone(), config.database.parameter_limit);
        Self::new(config, repo)
    }

    pub fn manip(&self, name: &str) -> Option<&Manip> {
        self.manips.get(name)
    }

    /// Absolute path of the original image behind a source record.
    pub fn locate_original(&self, record: &SourceRecord) -> Result<PathBuf> {
        self.source.locate(&record.source).or_raise(|| ErrorKind::Catalog)
    }

    /// Absolute path of a generated manip.
    pub fn locate_derived(&self, record: &DerivedRecord) -> Result<PathBuf> {
        self.content.locate(&record.file).or_raise(|| ErrorKind::Catalog)
    }
}
