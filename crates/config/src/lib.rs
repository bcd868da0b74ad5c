//! Configuration for kodak.
//!
//! Values are layered: built-in defaults, then an optional configuration
//! file (TOML, YAML or JSON, picked by extension), then environment
//! variables prefixed with `KODAK_`. Nested keys in the environment are
//! separated by a double underscore:
//!
//! ```text
//! KODAK_SOURCE_DIR=/srv/pictures
//! KODAK_DATABASE__PATH=/var/lib/kodak/kodak.db
//! KODAK_MANIPS__THUMB__SCALE__HORIZONTAL=100
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use kodak_catalog::SQLITE_VARIABLE_LIMIT;
use kodak_manip::Manip;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use kodak_manip::ORIGINAL as RESERVED_MANIP_NAME;

/// Prefix of environment variables read by [`Config::load`].
pub const ENV_PREFIX: &str = "KODAK_";

fn working_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn default_database_path() -> PathBuf {
    ProjectDirs::from("", "", "kodak")
        .map(|dirs| dirs.data_dir().join("kodak.db"))
        .unwrap_or_else(|| working_dir().join("kodak.db"))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite database file; created if missing.
    pub path: PathBuf,
    /// Upper bound on pooled connections. Uses the pool's default when unset.
    pub max_connections: Option<u32>,
    /// Maximum number of bound parameters per statement. `None` means the
    /// backend has no known limit and bulk writes go out in a single batch.
    pub parameter_limit: Option<usize>,
}
impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: None,
            parameter_limit: Some(SQLITE_VARIABLE_LIMIT),
        }
    }
}

/// Resolved configuration consumed by the catalog and the derived cache.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root of the (read-only) tree of original images.
    pub source_dir: PathBuf,
    /// Root of the tree that generated images and exposed links are written to.
    pub content_dir: PathBuf,
    /// Whether originals are linked into the content tree.
    pub expose_source: bool,
    /// Whether clients must authenticate. Carried for the HTTP layer only.
    pub private: bool,
    pub database: DatabaseConfig,
    /// Manips by name.
    pub manips: BTreeMap<String, Manip>,
}
impl Default for Config {
    fn default() -> Self {
        let cwd = working_dir();
        Self {
            source_dir: cwd.join("pictures"),
            content_dir: cwd.join("content"),
            expose_source: false,
            private: false,
            database: DatabaseConfig::default(),
            manips: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Layer an optional configuration file and the environment on top of
    /// the defaults.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::new();
        if let Some(path) = file {
            let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
            figment = match extension.as_deref() {
                Some("toml") => figment.merge(Toml::file_exact(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
                Some("json") => figment.merge(Json::file_exact(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFile(path.to_path_buf())),
            };
            tracing::debug!(path = %path.display(), "Loading configuration file");
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Load and validate configuration from all sources.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(file)?)
    }

    /// Extract and validate configuration from an already-layered figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.resolve()
    }

    /// Fill in manip names, make directories absolute, and check every value.
    fn resolve(mut self) -> Result<Self> {
        for (key, manip) in self.manips.iter_mut() {
            if manip.name.is_empty() {
                manip.name = key.clone();
            } else if manip.name != *key {
                exn::bail!(ErrorKind::Invalid(format!(
                    "manip `{key}` is named `{}`; names must match their key",
                    manip.name
                )));
            }
            manip
                .validate()
                .or_raise(|| ErrorKind::Invalid(format!("manip `{key}`")))?;
        }
        self.source_dir = absolute(&self.source_dir)?;
        self.content_dir = absolute(&self.content_dir)?;
        self.database.path = absolute(&self.database.path)?;
        if self.source_dir == self.content_dir {
            exn::bail!(ErrorKind::Invalid("source and content directories must differ".to_string()));
        }
        if self.database.max_connections == Some(0) {
            exn::bail!(ErrorKind::Invalid("database.max_connections must be positive".to_string()));
        }
        if self.database.parameter_limit == Some(0) {
            exn::bail!(ErrorKind::Invalid("database.parameter_limit must be positive".to_string()));
        }
        tracing::debug!(manips = self.manips.len(), source = %self.source_dir.display(), "Configuration resolved");
        Ok(self)
    }

    pub fn manip(&self, name: &str) -> Option<&Manip> {
        self.manips.get(name)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).or_raise(|| ErrorKind::Invalid(format!("path `{}`", path.display())))
}
